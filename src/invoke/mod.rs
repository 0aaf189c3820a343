//! Signatures, handles and the machinery that links and invokes them.

pub mod bootstrap;
pub mod call_site;
pub(crate) mod cell;
pub mod combinators;
pub mod describe;
pub mod direct;
pub(crate) mod form;
pub mod handle;
pub(crate) mod intern;
pub mod signature;

pub use bootstrap::{Bootstrap, DynamicCallPoint, link_call_site};
pub use call_site::CallSite;
pub use describe::HandleDescription;
pub use direct::{MemberInfo, RefKind};
pub use handle::MethodHandle;
pub use signature::{MAX_ARITY, Signature, method_type};

#[cfg(test)]
mod handle_test;
