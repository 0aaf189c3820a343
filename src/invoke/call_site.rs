//! Call sites: cells holding the current target of an indirect call point.

use std::fmt;
use std::sync::{Arc, OnceLock, atomic};

use tracing::debug;

use crate::error::{InvokeError, InvokeResult, illegal_argument};
use crate::invoke::{cell::TargetCell, form::Form, handle::MethodHandle, signature::Signature};
use crate::telemetry;

/// Mutable and volatile sites share one cell with volatile ordering.
enum Cell {
    Constant(OnceLock<MethodHandle>),
    Mutable(TargetCell),
    Volatile(TargetCell),
}

struct SiteData {
    signature: Signature,
    cell: Cell,
}

/// A linkage cell whose target always has the site's signature.
#[derive(Clone)]
pub struct CallSite(Arc<SiteData>);

impl CallSite {
    fn create(signature: Signature, cell: Cell) -> CallSite {
        telemetry::record_call_site();
        CallSite(Arc::new(SiteData { signature, cell }))
    }

    /// A site permanently bound to `target`.
    pub fn constant(target: MethodHandle) -> CallSite {
        let cell = OnceLock::new();
        let signature = target.signature().clone();
        let _ = cell.set(target);
        CallSite::create(signature, Cell::Constant(cell))
    }

    /// A constant site whose target is computed by `hook`. The hook sees the
    /// site with its signature assigned; reading its target from inside the
    /// hook is an `IllegalState` error.
    pub fn constant_with<F>(signature: Signature, hook: F) -> InvokeResult<CallSite>
    where
        F: FnOnce(&CallSite) -> InvokeResult<MethodHandle>,
    {
        let site = CallSite::create(signature, Cell::Constant(OnceLock::new()));
        let target = hook(&site)?;
        if target.signature() != site.signature() {
            return Err(InvokeError::WrongMethodType(format!(
                "constant call site of {} cannot take a target of {}",
                site.signature(),
                target.signature()
            )));
        }
        if let Cell::Constant(cell) = &site.0.cell
            && cell.set(target).is_err()
        {
            return Err(InvokeError::IllegalState(
                "constant call site initialized twice".into(),
            ));
        }
        Ok(site)
    }

    /// A site whose target may be replaced, with no ordering promise to
    /// concurrent invokers.
    pub fn mutable(target: MethodHandle) -> CallSite {
        let signature = target.signature().clone();
        CallSite::create(signature, Cell::Mutable(TargetCell::new(target)))
    }

    /// A site whose replacements are published to every later invocation.
    pub fn volatile(target: MethodHandle) -> CallSite {
        let signature = target.signature().clone();
        CallSite::create(signature, Cell::Volatile(TargetCell::new(target)))
    }

    pub fn mutable_uninitialized(signature: Signature) -> CallSite {
        let target = uninitialized(&signature);
        CallSite::create(signature, Cell::Mutable(TargetCell::new(target)))
    }

    pub fn volatile_uninitialized(signature: Signature) -> CallSite {
        let target = uninitialized(&signature);
        CallSite::create(signature, Cell::Volatile(TargetCell::new(target)))
    }

    pub fn signature(&self) -> &Signature {
        &self.0.signature
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.0.cell, Cell::Constant(_))
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self.0.cell {
            Cell::Constant(_) => "constant",
            Cell::Mutable(_) => "mutable",
            Cell::Volatile(_) => "volatile",
        }
    }

    pub fn target(&self) -> InvokeResult<MethodHandle> {
        match &self.0.cell {
            Cell::Constant(cell) => cell.get().cloned().ok_or_else(|| {
                InvokeError::IllegalState(
                    "constant call site target read before initialization".into(),
                )
            }),
            Cell::Mutable(cell) | Cell::Volatile(cell) => Ok(cell.load()),
        }
    }

    pub fn set_target(&self, target: MethodHandle) -> InvokeResult<()> {
        let cell = match &self.0.cell {
            Cell::Constant(_) => {
                return Err(InvokeError::UnsupportedOperation(
                    "constant call site target cannot change".into(),
                ));
            }
            Cell::Mutable(cell) | Cell::Volatile(cell) => cell,
        };
        if target.signature() != self.signature() {
            return Err(illegal_argument(format!(
                "call site of {} cannot take a target of {}",
                self.signature(),
                target.signature()
            )));
        }
        cell.store(target);
        telemetry::record_retarget();
        debug!(kind = self.kind_name(), signature = %self.signature(), "call site retargeted");
        Ok(())
    }

    /// Handle that invokes whatever target the site holds at call time.
    pub fn dynamic_invoker(&self) -> MethodHandle {
        if let Cell::Constant(cell) = &self.0.cell
            && let Some(target) = cell.get()
        {
            return target.clone();
        }
        MethodHandle::new(self.signature().clone(), Form::Indirect(self.clone()))
    }

    /// Publishes the current targets of mutable sites to all threads.
    pub fn sync_all(sites: &[CallSite]) -> InvokeResult<()> {
        if let Some(site) = sites
            .iter()
            .find(|site| !matches!(site.0.cell, Cell::Mutable(_)))
        {
            return Err(illegal_argument(format!(
                "sync_all expects mutable call sites, got a {} site",
                site.kind_name()
            )));
        }
        atomic::fence(atomic::Ordering::SeqCst);
        Ok(())
    }

    pub fn same_site(&self, other: &CallSite) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

fn uninitialized(signature: &Signature) -> MethodHandle {
    MethodHandle::from_fn("uninitialized call site", signature.clone(), |_| {
        Err(InvokeError::IllegalState(
            "call site has no target yet".into(),
        ))
    })
}

impl fmt::Debug for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallSite[{} {}]", self.kind_name(), self.signature())
    }
}
