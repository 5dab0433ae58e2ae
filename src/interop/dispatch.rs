//! Dispatch cache - per-type conversion strategy, selected once
//!
//! Append-only: rows are published through `DashMap::entry`, so concurrent
//! first use of a type runs selection once and every caller observes the
//! same `Arc<DispatchEntry>`.

use super::types::{DispatchEntry, Strategy, TypeDescriptor};
use crate::host::{HostType, TypeKey, TypeKind};
use crate::logging::log_strategy_selected;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct DispatchCache {
    entries: DashMap<TypeKey, Arc<DispatchEntry>>,
    selections: AtomicUsize,
}

impl DispatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached strategy for `target`, selecting it on first use
    pub fn resolve(&self, target: &HostType) -> Arc<DispatchEntry> {
        if let Some(entry) = self.entries.get(&target.key()) {
            return Arc::clone(entry.value());
        }

        let entry = self.entries.entry(target.key()).or_insert_with(|| {
            self.selections.fetch_add(1, Ordering::Relaxed);
            let entry = select(target);
            log_strategy_selected(target.name(), &format!("{:?}", entry.strategy));
            Arc::new(entry)
        });
        Arc::clone(entry.value())
    }

    /// Resolve every type ahead of first conversion
    pub fn warm<'a>(&self, targets: impl IntoIterator<Item = &'a HostType>) {
        for target in targets {
            self.resolve(target);
        }
    }

    pub fn contains(&self, target: &HostType) -> bool {
        self.entries.contains_key(&target.key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of times selection actually ran
    pub fn selections(&self) -> usize {
        self.selections.load(Ordering::Relaxed)
    }
}

/// Strategy selection, in priority order
fn select(target: &HostType) -> DispatchEntry {
    let (descriptor, strategy) = match target.kind() {
        TypeKind::ForeignHandle => (TypeDescriptor::ForeignHandle, Strategy::Passthrough),
        TypeKind::Array { element, rank } => {
            let strategy = if *rank > 1 { Strategy::MultiArray } else { Strategy::Array };
            (
                TypeDescriptor::Array {
                    element: element.clone(),
                    rank: *rank,
                },
                strategy,
            )
        }
        TypeKind::Enum(info) => (
            TypeDescriptor::Enum {
                underlying: info.underlying,
                flags: info.flags,
            },
            Strategy::Enum,
        ),
        TypeKind::Nullable(inner) => (TypeDescriptor::Nullable(inner.clone()), Strategy::Nullable),
        TypeKind::Object => (TypeDescriptor::AnyObject, Strategy::AnyObject),
        TypeKind::Type => (TypeDescriptor::AnyType, Strategy::AnyType),
        TypeKind::Primitive(kind) => (TypeDescriptor::Primitive(*kind), Strategy::Scalar),
        TypeKind::List { .. } | TypeKind::Class(_) => {
            (TypeDescriptor::Instance(target.clone()), Strategy::Instance)
        }
    };

    DispatchEntry {
        target: target.clone(),
        descriptor,
        strategy,
    }
}
