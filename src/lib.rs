//! Typed method handles, adaptation combinators, access-checked lookups and
//! rebindable call sites over a small nominal host type model.

pub mod config;
pub mod error;
pub mod host;
pub mod invoke;
pub mod lookup;
pub mod telemetry;

pub use error::{InvokeError, InvokeResult};
pub use invoke::combinators;
pub use invoke::{
    Bootstrap, CallSite, DynamicCallPoint, HandleDescription, MAX_ARITY, MemberInfo, MethodHandle,
    RefKind, Signature, link_call_site, method_type,
};
pub use lookup::{AccessModes, Lookup};
