//! Process-wide runtime configuration.
//!
//! Configuration only tunes diagnostics and cache housekeeping. Access
//! rights are never read from here; they travel with explicit `Lookup`
//! values.

use std::sync::{
    RwLock,
    atomic::{AtomicBool, Ordering},
};

/// Interning tables are swept for dead entries once they grow past this size.
pub const DEFAULT_INTERN_PURGE_THRESHOLD: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub trace: bool,
    pub intern_purge_threshold: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            trace: false,
            intern_purge_threshold: DEFAULT_INTERN_PURGE_THRESHOLD,
        }
    }
}

impl RuntimeConfig {
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_intern_purge_threshold(mut self, threshold: usize) -> Self {
        self.intern_purge_threshold = threshold.max(1);
        self
    }

    /// Reads `LINKAGE_TRACE` and `LINKAGE_INTERN_PURGE` from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup("LINKAGE_TRACE") {
            config.trace = matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(threshold) =
            lookup("LINKAGE_INTERN_PURGE").and_then(|raw| raw.trim().parse::<usize>().ok())
        {
            config = config.with_intern_purge_threshold(threshold);
        }
        config
    }
}

static CURRENT: RwLock<Option<RuntimeConfig>> = RwLock::new(None);
static TRACE: AtomicBool = AtomicBool::new(false);

/// Installs `config` for the whole process, replacing any previous one.
pub fn install(config: RuntimeConfig) {
    TRACE.store(config.trace, Ordering::Relaxed);
    let mut slot = CURRENT.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = Some(config);
}

pub fn current() -> RuntimeConfig {
    let slot = CURRENT.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    slot.clone().unwrap_or_default()
}

/// Hot-path check for per-invocation tracing.
#[inline]
pub fn trace_enabled() -> bool {
    TRACE.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_quiet() {
        let config = RuntimeConfig::default();
        assert!(!config.trace);
        assert_eq!(config.intern_purge_threshold, DEFAULT_INTERN_PURGE_THRESHOLD);
    }

    #[test]
    fn reads_values_from_lookup() {
        let config = RuntimeConfig::from_lookup(|key| match key {
            "LINKAGE_TRACE" => Some("on".to_string()),
            "LINKAGE_INTERN_PURGE" => Some(" 64 ".to_string()),
            _ => None,
        });
        assert!(config.trace);
        assert_eq!(config.intern_purge_threshold, 64);
    }

    #[test]
    fn ignores_malformed_threshold() {
        let config = RuntimeConfig::from_lookup(|key| match key {
            "LINKAGE_INTERN_PURGE" => Some("lots".to_string()),
            _ => None,
        });
        assert_eq!(config.intern_purge_threshold, DEFAULT_INTERN_PURGE_THRESHOLD);
    }

    #[test]
    fn threshold_never_drops_to_zero() {
        let config = RuntimeConfig::default().with_intern_purge_threshold(0);
        assert_eq!(config.intern_purge_threshold, 1);
    }
}
