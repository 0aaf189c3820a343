//! Bootstrap linkage of dynamic call points.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::error::{InvokeError, InvokeResult};
use crate::host::value::Value;
use crate::invoke::{call_site::CallSite, handle::MethodHandle, signature::Signature};
use crate::lookup::Lookup;
use crate::telemetry;

/// Produces the call site for a dynamic call point.
pub trait Bootstrap: Send + Sync {
    fn bootstrap(
        &self,
        caller: &Lookup,
        name: &str,
        signature: &Signature,
        static_args: &[Value],
    ) -> InvokeResult<CallSite>;
}

impl<F> Bootstrap for F
where
    F: Fn(&Lookup, &str, &Signature, &[Value]) -> InvokeResult<CallSite> + Send + Sync,
{
    fn bootstrap(
        &self,
        caller: &Lookup,
        name: &str,
        signature: &Signature,
        static_args: &[Value],
    ) -> InvokeResult<CallSite> {
        self(caller, name, signature, static_args)
    }
}

/// Runs `bootstrap` and checks the call site it returns.
///
/// Link errors raised by the bootstrap pass through unchanged; any other
/// failure, and a site of the wrong signature, becomes a `Bootstrap` error.
pub fn link_call_site(
    bootstrap: &dyn Bootstrap,
    caller: &Lookup,
    name: &str,
    signature: &Signature,
    static_args: &[Value],
) -> InvokeResult<CallSite> {
    let site = match bootstrap.bootstrap(caller, name, signature, static_args) {
        Ok(site) => site,
        Err(err) if err.is_linkage() => return Err(err),
        Err(err) => {
            return Err(InvokeError::Bootstrap(format!(
                "call site initialization failed for {name}: {err}"
            )));
        }
    };
    if site.signature() != signature {
        return Err(InvokeError::Bootstrap(format!(
            "call site type mismatch for {name}: expected {signature}, got {}",
            site.signature()
        )));
    }
    telemetry::record_call_site_link();
    debug!(name, %signature, caller = %caller, "linked call site");
    Ok(site)
}

/// A call point linked on first use. The outcome of linking, success or
/// failure, is recorded once and reused by every later invocation.
pub struct DynamicCallPoint {
    caller: Lookup,
    name: String,
    signature: Signature,
    static_args: Vec<Value>,
    bootstrap: Arc<dyn Bootstrap>,
    linked: OnceLock<Result<(CallSite, MethodHandle), InvokeError>>,
}

impl DynamicCallPoint {
    pub fn new(
        caller: Lookup,
        name: &str,
        signature: Signature,
        bootstrap: impl Bootstrap + 'static,
        static_args: Vec<Value>,
    ) -> Self {
        Self {
            caller,
            name: name.to_string(),
            signature,
            static_args,
            bootstrap: Arc::new(bootstrap),
            linked: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn is_linked(&self) -> bool {
        matches!(self.linked.get(), Some(Ok(_)))
    }

    fn link(&self) -> InvokeResult<&(CallSite, MethodHandle)> {
        self.linked
            .get_or_init(|| {
                link_call_site(
                    self.bootstrap.as_ref(),
                    &self.caller,
                    &self.name,
                    &self.signature,
                    &self.static_args,
                )
                .map(|site| {
                    let invoker = site.dynamic_invoker();
                    (site, invoker)
                })
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn call_site(&self) -> InvokeResult<CallSite> {
        self.link().map(|(site, _)| site.clone())
    }

    /// Links if needed, then invokes the site's current target exactly.
    pub fn invoke_exact(&self, args: Vec<Value>) -> InvokeResult<Value> {
        let (_, invoker) = self.link()?;
        invoker.invoke_exact(args)
    }

    /// Links if needed, then invokes with argument conversion.
    pub fn invoke(&self, args: Vec<Value>) -> InvokeResult<Value> {
        let (_, invoker) = self.link()?;
        invoker.invoke(args)
    }
}

impl fmt::Debug for DynamicCallPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicCallPoint")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("linked", &self.is_linked())
            .finish()
    }
}
