//! Clause-based loops and the counted, while and iterating loops built on
//! them.
//!
//! A loop keeps one iteration variable per clause whose `init` or `step`
//! returns a value, followed by the loop parameters. Every clause function
//! receives a prefix of `(vars..., params...)`. Each pass runs the clauses
//! in order: the step updates the clause's variable, then a false predicate
//! ends the loop with that clause's finalizer.

use std::sync::Arc;

use crate::error::{InvokeError, InvokeResult, illegal_argument};
use crate::host::{
    builtins,
    class::{CallContext, Class},
    convert::coerce_argument,
    kind::Kind,
    value::Value,
};
use crate::invoke::{
    combinators::{constant::zero, drop::drop_arguments},
    form::Form,
    handle::MethodHandle,
    signature::{MAX_ARITY, Signature},
};

/// One clause of a loop. Every part is optional.
#[derive(Debug, Clone, Default)]
pub struct LoopClause {
    pub init: Option<MethodHandle>,
    pub step: Option<MethodHandle>,
    pub pred: Option<MethodHandle>,
    pub fini: Option<MethodHandle>,
}

impl LoopClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(mut self, handle: MethodHandle) -> Self {
        self.init = Some(handle);
        self
    }

    pub fn step(mut self, handle: MethodHandle) -> Self {
        self.step = Some(handle);
        self
    }

    pub fn pred(mut self, handle: MethodHandle) -> Self {
        self.pred = Some(handle);
        self
    }

    pub fn fini(mut self, handle: MethodHandle) -> Self {
        self.fini = Some(handle);
        self
    }

    fn is_empty(&self) -> bool {
        self.init.is_none() && self.step.is_none() && self.pred.is_none() && self.fini.is_none()
    }

    fn non_init(&self) -> impl Iterator<Item = &MethodHandle> {
        [&self.step, &self.pred, &self.fini].into_iter().flatten()
    }
}

struct PlannedClause {
    clause: LoopClause,
    var: Option<usize>,
}

pub(crate) struct LoopPlan {
    clauses: Vec<PlannedClause>,
    vars: Vec<Kind>,
    ret: Kind,
}

impl LoopPlan {
    pub(crate) fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    pub(crate) fn run(&self, args: Vec<Value>) -> InvokeResult<Value> {
        let mut state = Vec::with_capacity(self.vars.len() + args.len());
        for planned in &self.clauses {
            let initial = match &planned.clause.init {
                Some(init) => init.invoke_basic(args[..init.arity()].to_vec())?,
                None => Value::Void,
            };
            if let Some(var) = planned.var {
                state.push(match planned.clause.init {
                    Some(_) => initial,
                    None => self.vars[var].zero(),
                });
            }
        }
        state.extend(args);

        loop {
            for planned in &self.clauses {
                let clause = &planned.clause;
                if let Some(step) = &clause.step {
                    let next = step.invoke_basic(state[..step.arity()].to_vec())?;
                    if let Some(var) = planned.var {
                        state[var] = next;
                    }
                }
                if let Some(pred) = &clause.pred {
                    let verdict = pred.invoke_basic(state[..pred.arity()].to_vec())?;
                    if !verdict.as_bool().unwrap_or(false) {
                        return match &clause.fini {
                            Some(fini) => fini.invoke_basic(state[..fini.arity()].to_vec()),
                            None => Ok(self.ret.zero()),
                        };
                    }
                }
            }
        }
    }
}

fn is_prefix(prefix: &[Kind], of: &[Kind]) -> bool {
    of.starts_with(prefix)
}

/// Builds a loop from `clauses`. The loop's parameters are the longest
/// parameter list among the inits and the step, predicate and finalizer
/// suffixes after the iteration variables; its return kind is the common
/// finalizer return kind, or void without finalizers.
pub fn clause_loop(clauses: Vec<LoopClause>) -> InvokeResult<MethodHandle> {
    let clauses: Vec<LoopClause> = clauses.into_iter().filter(|c| !c.is_empty()).collect();
    if clauses.is_empty() {
        return Err(illegal_argument("no loop clauses passed"));
    }

    let mut vars = Vec::new();
    let mut planned = Vec::with_capacity(clauses.len());
    for (i, clause) in clauses.into_iter().enumerate() {
        let init_ret = clause.init.as_ref().map(|h| h.signature().ret().clone());
        let step_ret = clause.step.as_ref().map(|h| h.signature().ret().clone());
        if let (Some(init), Some(step)) = (&init_ret, &step_ret)
            && init != step
        {
            return Err(illegal_argument(format!(
                "clause {i}: init and step return types must match: {init} != {step}"
            )));
        }
        let var_kind = init_ret.or(step_ret).filter(|k| !k.is_void());
        let var = var_kind.map(|kind| {
            vars.push(kind);
            vars.len() - 1
        });
        planned.push(PlannedClause { clause, var });
    }

    let mut collected: Vec<&[Kind]> = Vec::new();
    for p in &planned {
        if let Some(init) = &p.clause.init {
            collected.push(init.signature().params());
        }
        for handle in p.clause.non_init() {
            let params = handle.signature().params();
            if params.len() > vars.len() && params.starts_with(&vars) {
                collected.push(&params[vars.len()..]);
            }
        }
    }
    let loop_params: Vec<Kind> = collected
        .iter()
        .max_by_key(|params| params.len())
        .map(|params| params.to_vec())
        .unwrap_or_default();
    if collected.iter().any(|params| !is_prefix(params, &loop_params)) {
        return Err(illegal_argument(format!(
            "found non-effectively identical parameter type lists: {collected:?}"
        )));
    }
    if vars.len() + loop_params.len() > MAX_ARITY {
        return Err(illegal_argument(format!(
            "loop has {} iteration variables and {} parameters, more than {MAX_ARITY}",
            vars.len(),
            loop_params.len()
        )));
    }

    let full: Vec<Kind> = vars.iter().chain(&loop_params).cloned().collect();
    let mut ret: Option<Kind> = None;
    let mut has_pred = false;
    for (i, p) in planned.iter().enumerate() {
        for handle in p.clause.non_init() {
            if !is_prefix(handle.signature().params(), &full) {
                return Err(illegal_argument(format!(
                    "clause {i}: parameters of {} do not match the loop prefix {full:?}",
                    handle.signature()
                )));
            }
        }
        if let Some(pred) = &p.clause.pred {
            if pred.signature().ret() != &Kind::BOOLEAN {
                return Err(illegal_argument(format!(
                    "clause {i}: loop predicate must return boolean: {}",
                    pred.signature()
                )));
            }
            has_pred = true;
        }
        if let Some(fini) = &p.clause.fini {
            let fini_ret = fini.signature().ret();
            match &ret {
                Some(existing) if existing != fini_ret => {
                    return Err(illegal_argument(format!(
                        "found non-identical finalizer return types: {existing} != {fini_ret}"
                    )));
                }
                Some(_) => {}
                None => ret = Some(fini_ret.clone()),
            }
        }
    }
    if !has_pred {
        return Err(illegal_argument("no predicate found in loop clauses"));
    }

    let ret = ret.unwrap_or(Kind::Void);
    let signature = Signature::new(ret.clone(), loop_params)?;
    Ok(MethodHandle::new(
        signature,
        Form::Looping(Arc::new(LoopPlan {
            clauses: planned,
            vars,
            ret,
        })),
    ))
}

/// Kinds `(int limit, V v, int i)`, omitting `v` for a void body.
fn counter_prefix(body_ret: &Kind) -> Vec<Kind> {
    if body_ret.is_void() {
        vec![Kind::INT, Kind::INT]
    } else {
        vec![Kind::INT, body_ret.clone(), Kind::INT]
    }
}

/// Runs `body(v, i, params...)` for each `i` from `start(params...)` up to
/// but excluding `end(params...)`, threading `v` from `init(params...)`.
/// No iteration happens when `end <= start`.
pub fn counted_loop(
    start: &MethodHandle,
    end: &MethodHandle,
    init: Option<&MethodHandle>,
    body: &MethodHandle,
) -> InvokeResult<MethodHandle> {
    for (what, bound) in [("start", start), ("end", end)] {
        if bound.signature().ret() != &Kind::INT {
            return Err(illegal_argument(format!(
                "{what} must return int: {}",
                bound.signature()
            )));
        }
    }
    let body_ret = body.signature().ret().clone();
    let leading: Vec<Kind> = if body_ret.is_void() {
        vec![Kind::INT]
    } else {
        vec![body_ret.clone(), Kind::INT]
    };
    if !body.signature().params().starts_with(&leading) {
        return Err(illegal_argument(format!(
            "body parameters must start with {leading:?}: {}",
            body.signature()
        )));
    }
    if let Some(init) = init
        && init.signature().ret() != &body_ret
    {
        return Err(illegal_argument(format!(
            "loop initializer must return {body_ret}: {}",
            init.signature()
        )));
    }

    let prefix = counter_prefix(&body_ret);
    let index_slot = prefix.len() - 1;
    let test = MethodHandle::from_fn(
        "counted_loop_test",
        Signature::new(Kind::BOOLEAN, prefix.clone())?,
        move |args| {
            let limit = args[0].as_int().unwrap_or(0);
            let index = args[index_slot].as_int().unwrap_or(0);
            Ok(Value::Boolean(index < limit))
        },
    );
    let increment = MethodHandle::from_fn(
        "counted_loop_increment",
        Signature::new(Kind::INT, prefix)?,
        move |args| {
            let index = args[index_slot].as_int().unwrap_or(0);
            index
                .checked_add(1)
                .map(Value::Int)
                .ok_or_else(|| InvokeError::Arithmetic("loop counter overflow".into()))
        },
    );

    let mut limit = LoopClause::new().init(end.clone()).pred(test);
    if !body_ret.is_void() {
        limit = limit.fini(MethodHandle::from_fn(
            "counted_loop_result",
            Signature::new(body_ret.clone(), [Kind::INT, body_ret.clone()])?,
            |args| Ok(args.into_iter().nth(1).unwrap_or(Value::Null)),
        ));
    }
    let mut accumulate = LoopClause::new().step(drop_arguments(body, 0, &[Kind::INT])?);
    if let Some(init) = init {
        accumulate = accumulate.init(init.clone());
    }
    let index = LoopClause::new().init(start.clone()).step(increment);

    clause_loop(vec![limit, accumulate, index])
}

/// `counted_loop` from zero to `iterations(params...)`.
pub fn counted_loop_to(
    iterations: &MethodHandle,
    init: Option<&MethodHandle>,
    body: &MethodHandle,
) -> InvokeResult<MethodHandle> {
    counted_loop(&zero(Kind::INT), iterations, init, body)
}

fn loop_result(body_ret: &Kind) -> InvokeResult<Option<MethodHandle>> {
    if body_ret.is_void() {
        return Ok(None);
    }
    let signature = Signature::new(body_ret.clone(), [body_ret.clone()])?;
    Ok(Some(MethodHandle::from_fn("loop_result", signature, |args| {
        Ok(args.into_iter().next().unwrap_or(Value::Null))
    })))
}

fn while_clauses(
    init: Option<&MethodHandle>,
    pred: &MethodHandle,
    body: &MethodHandle,
) -> InvokeResult<(LoopClause, LoopClause)> {
    let mut check = LoopClause::new().pred(pred.clone());
    if let Some(fini) = loop_result(body.signature().ret())? {
        check = check.fini(fini);
    }
    let mut update = LoopClause::new().step(body.clone());
    if let Some(init) = init {
        update = update.init(init.clone());
    }
    Ok((check, update))
}

/// Tests `pred(v, params...)` before each `v = body(v, params...)`.
pub fn while_loop(
    init: Option<&MethodHandle>,
    pred: &MethodHandle,
    body: &MethodHandle,
) -> InvokeResult<MethodHandle> {
    let (check, update) = while_clauses(init, pred, body)?;
    clause_loop(vec![check, update])
}

/// Runs `v = body(v, params...)` before each test of `pred(v, params...)`.
pub fn do_while_loop(
    init: Option<&MethodHandle>,
    body: &MethodHandle,
    pred: &MethodHandle,
) -> InvokeResult<MethodHandle> {
    let (check, update) = while_clauses(init, pred, body)?;
    clause_loop(vec![update, check])
}

fn call_no_args(receiver: &Value, name: &str, ret: Kind) -> InvokeResult<Value> {
    let class = receiver
        .runtime_class()
        .ok_or_else(|| InvokeError::NullPointer(format!("cannot call {name} on null")))?;
    let signature = Signature::trusted(ret, Vec::new());
    let method = Class::select_implementation(&class, name, &signature).ok_or_else(|| {
        InvokeError::Linkage(format!("{} has no implementation of {name}", class.name()))
    })?;
    method.call(&CallContext::default(), vec![receiver.clone()])
}

/// Turns an array, iterator or iterable into an iterator object.
fn cursor_of(source: Value) -> InvokeResult<Value> {
    let core = builtins::core();
    match &source {
        Value::Null => Err(InvokeError::NullPointer("cannot iterate over null".into())),
        Value::Array(array) => Ok(Value::Object(builtins::array_iterator(array.clone())?)),
        Value::Object(object) if object.class().is_subclass_of(&core.iterator) => Ok(source),
        Value::Object(object) if object.class().is_subclass_of(&core.iterable) => {
            call_no_args(&source, "iterator", Kind::Ref(core.iterator.clone()))
        }
        other => Err(InvokeError::ClassCast(format!(
            "{} is neither an array, an Iterator nor an Iterable",
            other.type_name()
        ))),
    }
}

/// Runs `v = body(v, element, params...)` for each element produced by
/// `iterator(params...)`, or by the first parameter when no iterator is
/// given. Sources may be arrays, `Iterator` objects or `Iterable` objects.
pub fn iterated_loop(
    iterator: Option<&MethodHandle>,
    init: Option<&MethodHandle>,
    body: &MethodHandle,
) -> InvokeResult<MethodHandle> {
    let body_signature = body.signature();
    let body_ret = body_signature.ret().clone();
    let element_slot = usize::from(!body_ret.is_void());
    if !body_ret.is_void() && body_signature.param(0) != Some(&body_ret) {
        return Err(illegal_argument(format!(
            "body must take its loop variable first: {body_signature}"
        )));
    }
    let element = body_signature.param(element_slot).cloned().ok_or_else(|| {
        illegal_argument(format!("body must take a loop element: {body_signature}"))
    })?;
    if let Some(init) = init
        && init.signature().ret() != &body_ret
    {
        return Err(illegal_argument(format!(
            "loop initializer must return {body_ret}: {}",
            init.signature()
        )));
    }
    let body_params = &body_signature.params()[element_slot + 1..];

    let source_params: Vec<Kind> = match iterator {
        Some(iterator) => {
            if !iterator.signature().ret().is_reference() {
                return Err(illegal_argument(format!(
                    "iterator must return a reference: {}",
                    iterator.signature()
                )));
            }
            iterator.signature().params().to_vec()
        }
        None => {
            let longest = [Some(body_params), init.map(|h| h.signature().params())]
                .into_iter()
                .flatten()
                .max_by_key(|params| params.len())
                .unwrap_or_default();
            match longest.first() {
                Some(first) if first.is_reference() => vec![first.clone()],
                _ => {
                    return Err(illegal_argument(format!(
                        "iterated loop needs a leading iterable parameter: {body_signature}"
                    )));
                }
            }
        }
    };

    let object = Kind::object();
    let source = iterator.cloned();
    let start = MethodHandle::from_fn(
        "iterated_loop_start",
        Signature::new(object.clone(), source_params)?,
        move |args| match &source {
            Some(iterator) => cursor_of(iterator.invoke_basic(args)?),
            None => cursor_of(args.into_iter().next().unwrap_or(Value::Null)),
        },
    );
    let has_next = MethodHandle::from_fn(
        "iterated_loop_test",
        Signature::new(Kind::BOOLEAN, [object.clone()])?,
        |args| call_no_args(&args[0], "hasNext", Kind::BOOLEAN),
    );
    let mut cursor = LoopClause::new().init(start).pred(has_next);
    if !body_ret.is_void() {
        cursor = cursor.fini(MethodHandle::from_fn(
            "iterated_loop_result",
            Signature::new(body_ret.clone(), [object.clone(), body_ret.clone()])?,
            |args| Ok(args.into_iter().nth(1).unwrap_or(Value::Null)),
        ));
    }

    let mut step_params = vec![object];
    if !body_ret.is_void() {
        step_params.push(body_ret.clone());
    }
    step_params.extend(body_params.iter().cloned());
    let target = body.clone();
    let step = MethodHandle::from_fn(
        "iterated_loop_step",
        Signature::new(body_ret.clone(), step_params)?,
        move |mut args| {
            let cursor = args.remove(0);
            let next = call_no_args(&cursor, "next", Kind::object())?;
            args.insert(element_slot, coerce_argument(next, &element)?);
            target.invoke_basic(args)
        },
    );
    let mut update = LoopClause::new().step(step);
    if let Some(init) = init {
        update = update.init(init.clone());
    }
    clause_loop(vec![cursor, update])
}
