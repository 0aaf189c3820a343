//! Canonical signature table.
//!
//! Entries hold weak references so that signatures nobody uses can be
//! dropped. A dead entry is replaced on the next request for the same kinds
//! and swept in bulk once the table grows past the configured threshold.

use std::sync::{Arc, OnceLock, Weak};

use dashmap::{DashMap, mapref::entry::Entry};
use tracing::trace;

use crate::config;
use crate::host::kind::Kind;
use crate::invoke::signature::{Signature, SignatureData};
use crate::telemetry;

#[derive(PartialEq, Eq, Hash)]
struct Key {
    ret: Kind,
    params: Box<[Kind]>,
}

fn table() -> &'static DashMap<Key, Weak<SignatureData>> {
    static TABLE: OnceLock<DashMap<Key, Weak<SignatureData>>> = OnceLock::new();
    TABLE.get_or_init(DashMap::new)
}

pub(crate) fn intern(ret: Kind, params: Vec<Kind>) -> Signature {
    let key = Key {
        ret,
        params: params.into_boxed_slice(),
    };
    let (signature, inserted) = match table().entry(key) {
        Entry::Occupied(mut entry) => match entry.get().upgrade() {
            Some(live) => (Signature::from_data(live), false),
            None => {
                let data = fresh(entry.key());
                entry.insert(Arc::downgrade(&data));
                (Signature::from_data(data), true)
            }
        },
        Entry::Vacant(entry) => {
            let data = fresh(entry.key());
            entry.insert(Arc::downgrade(&data));
            (Signature::from_data(data), true)
        }
    };
    if inserted {
        telemetry::record_signature();
        if table().len() > config::current().intern_purge_threshold {
            purge();
        }
    }
    signature
}

fn fresh(key: &Key) -> Arc<SignatureData> {
    Arc::new(SignatureData {
        ret: key.ret.clone(),
        params: key.params.clone(),
    })
}

/// Drops entries whose signature is no longer referenced.
pub(crate) fn purge() {
    let before = table().len();
    table().retain(|_, weak| weak.strong_count() > 0);
    trace!(before, after = table().len(), "purged signature table");
}

/// Number of entries whose signature is still alive.
#[cfg(test)]
pub(crate) fn live_count() -> usize {
    table()
        .iter()
        .filter(|entry| entry.value().strong_count() > 0)
        .count()
}
