//! Variable slots: where retention is enforced

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::mapping::VariableDecl;
use crate::provider::{Provider, Retention};

/// What a slot takes its value from
pub(crate) enum SlotSource {
    /// A provider from the registry
    Registered(Arc<dyn Provider>),
    /// A variable declared in the mapping document
    Declared(VariableDecl),
}

/// One variable as seen by one resolver
pub(crate) struct VariableSlot {
    source: SlotSource,
    retention: Retention,
    frozen: OnceCell<String>,
}

impl VariableSlot {
    pub(crate) fn registered(provider: Arc<dyn Provider>) -> Self {
        let retention = provider.retention();
        Self {
            source: SlotSource::Registered(provider),
            retention,
            frozen: OnceCell::new(),
        }
    }

    pub(crate) fn declared(decl: VariableDecl) -> Self {
        let retention = decl.retention();
        Self {
            source: SlotSource::Declared(decl),
            retention,
            frozen: OnceCell::new(),
        }
    }

    pub(crate) fn source(&self) -> &SlotSource {
        &self.source
    }

    /// Whether this slot is bound to exactly `provider`
    pub(crate) fn is_bound_to(&self, provider: &Arc<dyn Provider>) -> bool {
        match &self.source {
            SlotSource::Registered(p) => std::ptr::addr_eq(Arc::as_ptr(p), Arc::as_ptr(provider)),
            SlotSource::Declared(_) => false,
        }
    }

    pub(crate) fn is_declared(&self) -> bool {
        matches!(self.source, SlotSource::Declared(_))
    }

    /// The slot's value, computing it with `compute` when needed.
    ///
    /// A cached slot keeps the first value that was stored, even when several
    /// threads computed one concurrently. `None` is never frozen.
    pub(crate) fn value<F>(&self, compute: F) -> Option<String>
    where
        F: FnOnce() -> Option<String>,
    {
        match self.retention {
            Retention::Lazy => compute(),
            Retention::Cached => {
                if let Some(v) = self.frozen.get() {
                    return Some(v.clone());
                }
                let computed = compute()?;
                let _ = self.frozen.set(computed);
                self.frozen.get().cloned()
            }
        }
    }
}
