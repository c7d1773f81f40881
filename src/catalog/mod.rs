//! In-memory catalog of the four upstream collections
//!
//! The store is the only shared state request handlers read. Each collection
//! sits behind its own lock as an `Arc<Vec<_>>` and is swapped as a whole, so
//! a reader sees either the old or the new collection for a kind, never a mix.
//! There is no atomicity across kinds: after a partial refresh, artists may be
//! newer than relations.

pub mod query;
pub mod relations;

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::models::{Artist, Collection, ConcertDates, Location, Relation, ResourceKind};

/// Process-wide holder of the current collections
#[derive(Debug, Default)]
pub struct CatalogStore {
    artists: RwLock<Arc<Vec<Artist>>>,
    locations: RwLock<Arc<Vec<Location>>>,
    dates: RwLock<Arc<Vec<ConcertDates>>>,
    relations: RwLock<Arc<Vec<Relation>>>,
}

/// Record counts per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub artists: usize,
    pub locations: usize,
    pub dates: usize,
    pub relations: usize,
}

fn snapshot<T>(slot: &RwLock<Arc<Vec<T>>>) -> Arc<Vec<T>> {
    Arc::clone(&slot.read().unwrap_or_else(PoisonError::into_inner))
}

fn swap<T>(slot: &RwLock<Arc<Vec<T>>>, records: Vec<T>) {
    let records = Arc::new(records);
    *slot.write().unwrap_or_else(PoisonError::into_inner) = records;
}

impl CatalogStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artists(&self) -> Arc<Vec<Artist>> {
        snapshot(&self.artists)
    }

    pub fn locations(&self) -> Arc<Vec<Location>> {
        snapshot(&self.locations)
    }

    pub fn dates(&self) -> Arc<Vec<ConcertDates>> {
        snapshot(&self.dates)
    }

    pub fn relations(&self) -> Arc<Vec<Relation>> {
        snapshot(&self.relations)
    }

    /// Replace the collection for the collection's own kind, leaving the others alone
    pub fn replace(&self, collection: Collection) {
        match collection {
            Collection::Artists(records) => swap(&self.artists, records),
            Collection::Locations(records) => swap(&self.locations, records),
            Collection::Dates(records) => swap(&self.dates, records),
            Collection::Relations(records) => swap(&self.relations, records),
        }
    }

    /// Number of records currently held for `kind`
    pub fn len(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Artists => self.artists().len(),
            ResourceKind::Locations => self.locations().len(),
            ResourceKind::Dates => self.dates().len(),
            ResourceKind::Relations => self.relations().len(),
        }
    }

    pub fn counts(&self) -> CatalogCounts {
        CatalogCounts {
            artists: self.len(ResourceKind::Artists),
            locations: self.len(ResourceKind::Locations),
            dates: self.len(ResourceKind::Dates),
            relations: self.len(ResourceKind::Relations),
        }
    }

    /// True when no kind holds any record
    pub fn is_empty(&self) -> bool {
        ResourceKind::ALL.iter().all(|kind| self.len(*kind) == 0)
    }
}
