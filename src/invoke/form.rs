//! Invocation strategies.
//!
//! A handle is a signature plus one `Form`. Every form receives arguments
//! that already fit the handle's signature exactly and produces a result
//! that fits its return kind; conversions happen only inside `Adapter`
//! steps that were planned when the handle was built.

use std::sync::Arc;

use crate::error::{InvokeError, InvokeResult, illegal_argument};
use crate::host::{
    class::ClassRef,
    convert::Conversion,
    kind::Kind,
    object::ArrayObject,
    value::Value,
};
use crate::invoke::{
    call_site::CallSite,
    combinators::{invokers::InvokerKind, loops::LoopPlan},
    direct::DirectTarget,
    handle::MethodHandle,
    signature::Signature,
};

#[derive(Clone)]
pub(crate) enum Form {
    Direct(DirectTarget),
    Bound {
        target: MethodHandle,
        value: Value,
    },
    Adapted {
        target: MethodHandle,
        adapter: Adapter,
    },
    Spreading {
        target: MethodHandle,
        pos: usize,
        count: usize,
        elements: Vec<Conversion>,
    },
    Collecting {
        target: MethodHandle,
        pos: usize,
        count: usize,
        component: Kind,
    },
    Guarded {
        test: MethodHandle,
        then: MethodHandle,
        otherwise: MethodHandle,
    },
    Switch {
        fallback: MethodHandle,
        targets: Arc<[MethodHandle]>,
    },
    Catching {
        target: MethodHandle,
        exception: ClassRef,
        handler: MethodHandle,
    },
    Finally {
        target: MethodHandle,
        cleanup: MethodHandle,
    },
    Looping(Arc<LoopPlan>),
    Indirect(CallSite),
    Invoker {
        kind: InvokerKind,
        target_type: Signature,
    },
}

/// Argument or return rewriting applied around an inner handle.
#[derive(Clone)]
pub(crate) enum Adapter {
    Insert {
        pos: usize,
        values: Arc<[Value]>,
    },
    Drop {
        pos: usize,
        count: usize,
    },
    Permute {
        reorder: Arc<[usize]>,
    },
    Filter {
        pos: usize,
        filters: Arc<[Option<MethodHandle>]>,
    },
    FilterReturn {
        filter: MethodHandle,
    },
    Collect {
        pos: usize,
        collector: MethodHandle,
    },
    Fold {
        pos: usize,
        combiner: MethodHandle,
    },
    Convert {
        params: Arc<[Conversion]>,
        ret: Conversion,
    },
}

impl Form {
    pub(crate) fn run(&self, mut args: Vec<Value>) -> InvokeResult<Value> {
        match self {
            Form::Direct(target) => target.invoke(args),
            Form::Bound { target, value } => {
                args.insert(0, value.clone());
                target.invoke_basic(args)
            }
            Form::Adapted { target, adapter } => adapter.run(target, args),
            Form::Spreading {
                target,
                pos,
                count,
                elements,
            } => {
                let spread = spread_array(args.remove(*pos), *count, elements)?;
                args.splice(*pos..*pos, spread);
                target.invoke_basic(args)
            }
            Form::Collecting {
                target,
                pos,
                count,
                component,
            } => {
                let collected: Vec<Value> = args.drain(*pos..*pos + *count).collect();
                let array = ArrayObject::from_values(component, collected)?;
                args.insert(*pos, Value::Array(array));
                target.invoke_basic(args)
            }
            Form::Guarded {
                test,
                then,
                otherwise,
            } => {
                let verdict = test.invoke_basic(args[..test.arity()].to_vec())?;
                if verdict.as_bool().unwrap_or(false) {
                    then.invoke_basic(args)
                } else {
                    otherwise.invoke_basic(args)
                }
            }
            Form::Switch { fallback, targets } => {
                let selected = args
                    .first()
                    .and_then(Value::as_int)
                    .and_then(|index| usize::try_from(index).ok())
                    .and_then(|index| targets.get(index))
                    .unwrap_or(fallback);
                selected.invoke_basic(args)
            }
            Form::Catching {
                target,
                exception,
                handler,
            } => match target.invoke_basic(args.clone()) {
                Err(err) if err.exception_class().is_subclass_of(exception) => {
                    let mut handler_args = Vec::with_capacity(handler.arity());
                    handler_args.push(Value::Object(err.to_throwable()));
                    handler_args.extend(args.into_iter().take(handler.arity() - 1));
                    handler.invoke_basic(handler_args)
                }
                other => other,
            },
            Form::Finally { target, cleanup } => run_finally(target, cleanup, args),
            Form::Looping(plan) => plan.run(args),
            Form::Indirect(site) => site.target()?.invoke_basic(args),
            Form::Invoker { kind, target_type } => kind.run(target_type, args),
        }
    }

    pub(crate) fn strategy(&self) -> &'static str {
        match self {
            Form::Direct(_) => "direct",
            Form::Bound { .. } => "bound",
            Form::Adapted { adapter, .. } => adapter.name(),
            Form::Spreading { .. } => "spread",
            Form::Collecting { .. } => "collect",
            Form::Guarded { .. } => "guard",
            Form::Switch { .. } => "switch",
            Form::Catching { .. } => "catch",
            Form::Finally { .. } => "finally",
            Form::Looping(_) => "loop",
            Form::Indirect(_) => "call-site",
            Form::Invoker { .. } => "invoker",
        }
    }
}

impl Adapter {
    fn run(&self, target: &MethodHandle, mut args: Vec<Value>) -> InvokeResult<Value> {
        match self {
            Adapter::Insert { pos, values } => {
                args.splice(*pos..*pos, values.iter().cloned());
                target.invoke_basic(args)
            }
            Adapter::Drop { pos, count } => {
                args.drain(*pos..*pos + *count);
                target.invoke_basic(args)
            }
            Adapter::Permute { reorder } => {
                let permuted = reorder.iter().map(|&i| args[i].clone()).collect();
                target.invoke_basic(permuted)
            }
            Adapter::Filter { pos, filters } => {
                for (offset, filter) in filters.iter().enumerate() {
                    if let Some(filter) = filter {
                        let slot = pos + offset;
                        let input = std::mem::replace(&mut args[slot], Value::Null);
                        args[slot] = filter.invoke_basic(vec![input])?;
                    }
                }
                target.invoke_basic(args)
            }
            Adapter::FilterReturn { filter } => {
                let result = target.invoke_basic(args)?;
                if filter.arity() == 0 {
                    filter.invoke_basic(Vec::new())
                } else {
                    filter.invoke_basic(vec![result])
                }
            }
            Adapter::Collect { pos, collector } => {
                let collected: Vec<Value> = args.drain(*pos..*pos + collector.arity()).collect();
                let result = collector.invoke_basic(collected)?;
                if !collector.signature().ret().is_void() {
                    args.insert(*pos, result);
                }
                target.invoke_basic(args)
            }
            Adapter::Fold { pos, combiner } => {
                let window = args[*pos..*pos + combiner.arity()].to_vec();
                let result = combiner.invoke_basic(window)?;
                if !combiner.signature().ret().is_void() {
                    args.insert(*pos, result);
                }
                target.invoke_basic(args)
            }
            Adapter::Convert { params, ret } => {
                let converted = args
                    .into_iter()
                    .zip(params.iter())
                    .map(|(value, conversion)| conversion.apply(value))
                    .collect::<InvokeResult<Vec<_>>>()?;
                ret.apply(target.invoke_basic(converted)?)
            }
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Adapter::Insert { .. } => "insert",
            Adapter::Drop { .. } => "drop",
            Adapter::Permute { .. } => "permute",
            Adapter::Filter { .. } => "filter",
            Adapter::FilterReturn { .. } => "filter-return",
            Adapter::Collect { .. } => "collect-arguments",
            Adapter::Fold { .. } => "fold",
            Adapter::Convert { .. } => "convert",
        }
    }
}

fn spread_array(array: Value, count: usize, elements: &[Conversion]) -> InvokeResult<Vec<Value>> {
    let values = match array {
        Value::Null if count == 0 => return Ok(Vec::new()),
        Value::Null => {
            return Err(InvokeError::NullPointer(format!(
                "cannot spread a null array into {count} arguments"
            )));
        }
        Value::Array(array) => array.to_vec(),
        other => {
            return Err(InvokeError::ClassCast(format!(
                "{} is not an array",
                other.type_name()
            )));
        }
    };
    if values.len() != count {
        return Err(illegal_argument(format!(
            "array is not of length {count}: {}",
            values.len()
        )));
    }
    values
        .into_iter()
        .zip(elements)
        .map(|(value, conversion)| conversion.apply(value))
        .collect()
}

fn run_finally(
    target: &MethodHandle,
    cleanup: &MethodHandle,
    args: Vec<Value>,
) -> InvokeResult<Value> {
    let outcome = target.invoke_basic(args.clone());
    let returns_value = !target.signature().ret().is_void();
    let (throwable, result) = match &outcome {
        Ok(value) => (Value::Null, value.clone()),
        Err(err) => (
            Value::Object(err.to_throwable()),
            target.signature().ret().zero(),
        ),
    };
    let leading = if returns_value { 2 } else { 1 };
    let mut cleanup_args = Vec::with_capacity(cleanup.arity());
    cleanup_args.push(throwable);
    if returns_value {
        cleanup_args.push(result);
    }
    cleanup_args.extend(args.into_iter().take(cleanup.arity() - leading));
    let cleaned = cleanup.invoke_basic(cleanup_args)?;
    match outcome {
        Err(original) => Err(original),
        Ok(_) => Ok(cleaned),
    }
}
