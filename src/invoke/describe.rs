//! Structural descriptions of handle trees, for debugging and snapshots.

use std::fmt;

use serde::Serialize;

use crate::invoke::{
    form::{Adapter, Form},
    handle::MethodHandle,
};

#[derive(Debug, Clone, Serialize)]
pub struct HandleDescription {
    pub strategy: String,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HandleDescription>,
}

impl HandleDescription {
    pub(crate) fn of(handle: &MethodHandle) -> HandleDescription {
        let (detail, children) = parts(handle.form());
        let strategy = if handle.is_varargs_collector() {
            format!("{} varargs", handle.form().strategy())
        } else {
            handle.form().strategy().to_string()
        };
        HandleDescription {
            strategy,
            signature: handle.signature().to_string(),
            detail,
            children: children.iter().map(HandleDescription::of).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{} {}", "", self.strategy, self.signature, indent = depth * 2)?;
        if let Some(detail) = &self.detail {
            write!(f, " [{detail}]")?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for HandleDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

fn parts(form: &Form) -> (Option<String>, Vec<MethodHandle>) {
    match form {
        Form::Direct(target) => (
            Some(match &target.member {
                Some(member) => member.to_string(),
                None => target.label.to_string(),
            }),
            vec![],
        ),
        Form::Bound { target, value } => (Some(format!("value={value}")), vec![target.clone()]),
        Form::Adapted { target, adapter } => {
            let (detail, mut extra) = adapter_parts(adapter);
            let mut children = vec![target.clone()];
            children.append(&mut extra);
            (detail, children)
        }
        Form::Spreading {
            target, pos, count, ..
        } => (Some(format!("pos={pos} count={count}")), vec![target.clone()]),
        Form::Collecting {
            target,
            pos,
            count,
            component,
        } => (
            Some(format!("pos={pos} count={count} component={component}")),
            vec![target.clone()],
        ),
        Form::Guarded {
            test,
            then,
            otherwise,
        } => (None, vec![test.clone(), then.clone(), otherwise.clone()]),
        Form::Switch { fallback, targets } => {
            let mut children = vec![fallback.clone()];
            children.extend(targets.iter().cloned());
            (Some(format!("cases={}", targets.len())), children)
        }
        Form::Catching {
            target,
            exception,
            handler,
        } => (
            Some(exception.name().to_string()),
            vec![target.clone(), handler.clone()],
        ),
        Form::Finally { target, cleanup } => (None, vec![target.clone(), cleanup.clone()]),
        Form::Looping(plan) => (Some(format!("clauses={}", plan.clause_count())), vec![]),
        Form::Indirect(site) => (Some(site.kind_name().to_string()), vec![]),
        Form::Invoker { kind, target_type } => (Some(format!("{kind} {target_type}")), vec![]),
    }
}

fn adapter_parts(adapter: &Adapter) -> (Option<String>, Vec<MethodHandle>) {
    match adapter {
        Adapter::Insert { pos, values } => {
            let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            (Some(format!("pos={pos} values=[{}]", rendered.join(", "))), vec![])
        }
        Adapter::Drop { pos, count } => (Some(format!("pos={pos} count={count}")), vec![]),
        Adapter::Permute { reorder } => (Some(format!("reorder={reorder:?}")), vec![]),
        Adapter::Filter { pos, filters } => (
            Some(format!("pos={pos}")),
            filters.iter().flatten().cloned().collect(),
        ),
        Adapter::FilterReturn { filter } => (None, vec![filter.clone()]),
        Adapter::Collect { pos, collector } => (Some(format!("pos={pos}")), vec![collector.clone()]),
        Adapter::Fold { pos, combiner } => (Some(format!("pos={pos}")), vec![combiner.clone()]),
        Adapter::Convert { .. } => (None, vec![]),
    }
}
