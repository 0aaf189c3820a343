use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::error::{InvokeResult, illegal_argument};
use crate::host::{
    domain::ClassDomain,
    kind::{Kind, Primitive},
};
use crate::invoke::intern;

/// Hard ceiling on the parameter count of any signature. One slot below
/// the 255 the calling convention allows is kept free for a receiver or
/// invoked handle.
pub const MAX_ARITY: usize = 254;

pub(crate) struct SignatureData {
    pub(crate) ret: Kind,
    pub(crate) params: Box<[Kind]>,
}

/// Parameter and return kinds of a handle.
///
/// Signatures are interned: two signatures with equal kinds are the same
/// allocation, so equality is a pointer comparison.
#[derive(Clone)]
pub struct Signature(Arc<SignatureData>);

/// Builds or looks up the canonical signature `(params)ret`.
pub fn method_type(ret: Kind, params: &[Kind]) -> InvokeResult<Signature> {
    Signature::new(ret, params.iter().cloned())
}

fn check_params(params: &[Kind]) -> InvokeResult<()> {
    if params.len() > MAX_ARITY {
        return Err(illegal_argument(format!(
            "signature arity {} exceeds the maximum of {MAX_ARITY}",
            params.len()
        )));
    }
    if let Some(index) = params.iter().position(Kind::is_void) {
        return Err(illegal_argument(format!(
            "void parameter type at index {index}"
        )));
    }
    Ok(())
}

impl Signature {
    pub fn new(ret: Kind, params: impl IntoIterator<Item = Kind>) -> InvokeResult<Signature> {
        let params: Vec<Kind> = params.into_iter().collect();
        check_params(&params)?;
        Ok(intern::intern(ret, params))
    }

    /// Interns kinds already known to be valid.
    pub(crate) fn trusted(ret: Kind, params: Vec<Kind>) -> Signature {
        intern::intern(ret, params)
    }

    pub(crate) fn from_data(data: Arc<SignatureData>) -> Signature {
        Signature(data)
    }

    /// `(Object, ..., Object)Object` with `arity` parameters.
    pub fn generic(arity: usize) -> InvokeResult<Signature> {
        Signature::new(Kind::object(), std::iter::repeat_n(Kind::object(), arity))
    }

    pub fn ret(&self) -> &Kind {
        &self.0.ret
    }

    pub fn params(&self) -> &[Kind] {
        &self.0.params
    }

    pub fn arity(&self) -> usize {
        self.0.params.len()
    }

    pub fn param(&self, index: usize) -> Option<&Kind> {
        self.0.params.get(index)
    }

    pub fn last_param(&self) -> Option<&Kind> {
        self.0.params.last()
    }

    pub fn change_param(&self, index: usize, kind: Kind) -> InvokeResult<Signature> {
        if index >= self.arity() {
            return Err(illegal_argument(format!(
                "parameter index {index} out of range for {self}"
            )));
        }
        let mut params = self.params().to_vec();
        params[index] = kind;
        Signature::new(self.ret().clone(), params)
    }

    pub fn change_return(&self, ret: Kind) -> Signature {
        Signature::trusted(ret, self.params().to_vec())
    }

    pub fn insert_params(&self, pos: usize, kinds: &[Kind]) -> InvokeResult<Signature> {
        if pos > self.arity() {
            return Err(illegal_argument(format!(
                "insert position {pos} out of range for {self}"
            )));
        }
        let mut params = self.params().to_vec();
        params.splice(pos..pos, kinds.iter().cloned());
        Signature::new(self.ret().clone(), params)
    }

    pub fn append_params(&self, kinds: &[Kind]) -> InvokeResult<Signature> {
        self.insert_params(self.arity(), kinds)
    }

    /// Removes parameters `start..end`.
    pub fn drop_params(&self, start: usize, end: usize) -> InvokeResult<Signature> {
        if start > end || end > self.arity() {
            return Err(illegal_argument(format!(
                "bad parameter range {start}..{end} for {self}"
            )));
        }
        let mut params = self.params().to_vec();
        params.drain(start..end);
        Ok(Signature::trusted(self.ret().clone(), params))
    }

    /// Every reference kind replaced by `Object`; primitives stay distinct.
    pub fn erase(&self) -> Signature {
        Signature::trusted(
            self.ret().erased(),
            self.params().iter().map(Kind::erased).collect(),
        )
    }

    /// Every slot replaced by `Object`, a void return included.
    pub fn generic_form(&self) -> Signature {
        let object = Kind::object();
        Signature::trusted(object.clone(), vec![object; self.arity()])
    }

    /// Primitives replaced by their wrappers.
    pub fn wrapped(&self) -> Signature {
        Signature::trusted(
            self.ret().wrapped(),
            self.params().iter().map(Kind::wrapped).collect(),
        )
    }

    /// Wrappers replaced by their primitives.
    pub fn unwrapped(&self) -> Signature {
        Signature::trusted(
            self.ret().unwrapped(),
            self.params().iter().map(Kind::unwrapped).collect(),
        )
    }

    pub fn has_primitives(&self) -> bool {
        self.ret().is_primitive() || self.params().iter().any(Kind::is_primitive)
    }

    pub fn has_wrappers(&self) -> bool {
        self.params()
            .iter()
            .chain(std::iter::once(self.ret()))
            .any(|k| k.unwrapped().is_primitive() && k.is_reference())
    }

    pub fn descriptor(&self) -> String {
        let params: String = self.params().iter().map(Kind::descriptor).collect();
        format!("({params}){}", self.ret().descriptor())
    }

    /// Parses `(params)ret` descriptors such as `(ILcore/String;)V`,
    /// resolving class names in `domain`.
    pub fn from_descriptor(text: &str, domain: &ClassDomain) -> InvokeResult<Signature> {
        let malformed = || illegal_argument(format!("malformed descriptor '{text}'"));
        let rest = text.strip_prefix('(').ok_or_else(malformed)?;
        let (param_text, ret_text) = rest.split_once(')').ok_or_else(malformed)?;

        let mut params = Vec::new();
        let mut cursor = param_text;
        while !cursor.is_empty() {
            let (kind, remaining) = parse_kind(cursor, domain, text)?;
            params.push(kind);
            cursor = remaining;
        }
        let (ret, remaining) = parse_kind(ret_text, domain, text)?;
        if !remaining.is_empty() {
            return Err(malformed());
        }
        Signature::new(ret, params)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

fn parse_kind<'a>(
    input: &'a str,
    domain: &ClassDomain,
    whole: &str,
) -> InvokeResult<(Kind, &'a str)> {
    let malformed = || illegal_argument(format!("malformed descriptor '{whole}'"));
    let mut chars = input.chars();
    let first = chars.next().ok_or_else(malformed)?;
    let rest = chars.as_str();
    match first {
        'V' => Ok((Kind::Void, rest)),
        'L' => {
            let (name, remaining) = rest.split_once(';').ok_or_else(malformed)?;
            let dotted = name.replace('/', ".");
            let class = domain.find_class(&dotted).ok_or_else(|| {
                illegal_argument(format!("unknown class {dotted} in descriptor '{whole}'"))
            })?;
            Ok((Kind::Ref(class), remaining))
        }
        '[' => {
            let (component, remaining) = parse_kind(rest, domain, whole)?;
            Ok((Kind::array_of(&component)?, remaining))
        }
        c => Primitive::from_descriptor(c)
            .map(|p| (Kind::Prim(p), rest))
            .ok_or_else(malformed),
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params().iter().map(|k| k.to_string()).collect();
        write!(f, "({}){}", params.join(","), self.ret())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
