use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TelemetryStats {
    pub handles_created: usize,
    pub signatures_interned: usize,
    pub call_sites_created: usize,
    pub call_sites_linked: usize,
    pub call_site_retargets: usize,
    pub classes_defined: usize,
}

static HANDLES_CREATED: AtomicUsize = AtomicUsize::new(0);
static SIGNATURES_INTERNED: AtomicUsize = AtomicUsize::new(0);
static CALL_SITES_CREATED: AtomicUsize = AtomicUsize::new(0);
static CALL_SITES_LINKED: AtomicUsize = AtomicUsize::new(0);
static CALL_SITE_RETARGETS: AtomicUsize = AtomicUsize::new(0);
static CLASSES_DEFINED: AtomicUsize = AtomicUsize::new(0);

pub fn record_handle() {
    HANDLES_CREATED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_signature() {
    SIGNATURES_INTERNED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_call_site() {
    CALL_SITES_CREATED.fetch_add(1, Ordering::Relaxed);
}

/// A bootstrap produced a site that passed its checks.
pub fn record_call_site_link() {
    CALL_SITES_LINKED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_retarget() {
    CALL_SITE_RETARGETS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_class_definition() {
    CLASSES_DEFINED.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> TelemetryStats {
    TelemetryStats {
        handles_created: HANDLES_CREATED.load(Ordering::Relaxed),
        signatures_interned: SIGNATURES_INTERNED.load(Ordering::Relaxed),
        call_sites_created: CALL_SITES_CREATED.load(Ordering::Relaxed),
        call_sites_linked: CALL_SITES_LINKED.load(Ordering::Relaxed),
        call_site_retargets: CALL_SITE_RETARGETS.load(Ordering::Relaxed),
        classes_defined: CLASSES_DEFINED.load(Ordering::Relaxed),
    }
}
