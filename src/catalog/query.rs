//! Lookups against the current catalog snapshot

use crate::models::{Artist, ArtistDetails, ConcertDates, Location, Relation, ResourceKind};
use crate::utils::error::CatalogError;

use super::relations::process_relation;
use super::CatalogStore;

impl CatalogStore {
    pub fn artist_by_id(&self, id: i64) -> Result<Artist, CatalogError> {
        self.artists()
            .iter()
            .find(|artist| artist.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound {
                kind: ResourceKind::Artists,
                id,
            })
    }

    pub fn locations_by_id(&self, id: i64) -> Result<Location, CatalogError> {
        self.locations()
            .iter()
            .find(|location| location.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound {
                kind: ResourceKind::Locations,
                id,
            })
    }

    pub fn dates_by_id(&self, id: i64) -> Result<ConcertDates, CatalogError> {
        self.dates()
            .iter()
            .find(|dates| dates.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound {
                kind: ResourceKind::Dates,
                id,
            })
    }

    /// Relation for `id`, processed for display. The stored record is left untouched.
    pub fn relation_by_id(&self, id: i64) -> Result<Relation, CatalogError> {
        let mut relation = self
            .relations()
            .iter()
            .find(|relation| relation.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound {
                kind: ResourceKind::Relations,
                id,
            })?;

        process_relation(&mut relation);
        Ok(relation)
    }

    /// Collect every record for one artist; any missing piece is a not-found error
    pub fn artist_details(&self, id: i64) -> Result<ArtistDetails, CatalogError> {
        Ok(ArtistDetails {
            artist: self.artist_by_id(id)?,
            locations: self.locations_by_id(id)?,
            dates: self.dates_by_id(id)?,
            relations: self.relation_by_id(id)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Collection;
    use std::collections::HashMap;

    fn populated_store() -> CatalogStore {
        let store = CatalogStore::new();
        store.replace(Collection::Artists(vec![
            Artist {
                id: 1,
                name: "Artist 1".to_string(),
                ..Default::default()
            },
            Artist {
                id: 2,
                name: "Artist 2".to_string(),
                ..Default::default()
            },
        ]));
        store.replace(Collection::Locations(vec![Location {
            id: 1,
            locations: vec!["Loc1".to_string()],
            dates: String::new(),
        }]));
        store.replace(Collection::Dates(vec![ConcertDates {
            id: 1,
            dates: vec!["2023-01-01".to_string()],
        }]));
        store.replace(Collection::Relations(vec![Relation {
            id: 1,
            dates_locations: HashMap::from([(
                "paris-france".to_string(),
                vec!["01-01-2020".to_string()],
            )]),
            sorted_locations: Vec::new(),
        }]));
        store
    }

    #[test]
    fn test_artist_by_id() {
        let store = populated_store();
        assert_eq!(store.artist_by_id(1).unwrap().name, "Artist 1");
        assert_eq!(
            store.artist_by_id(999),
            Err(CatalogError::NotFound {
                kind: ResourceKind::Artists,
                id: 999
            })
        );
    }

    #[test]
    fn test_locations_and_dates_by_id() {
        let store = populated_store();
        assert_eq!(store.locations_by_id(1).unwrap().locations, vec!["Loc1"]);
        assert!(store.locations_by_id(999).is_err());
        assert_eq!(store.dates_by_id(1).unwrap().id, 1);
        assert!(store.dates_by_id(999).is_err());
    }

    #[test]
    fn test_relation_by_id_is_processed() {
        let store = populated_store();
        let relation = store.relation_by_id(1).unwrap();

        assert!(!relation.dates_locations.contains_key("paris-france"));
        assert!(relation.dates_locations.contains_key("Paris, France"));
        assert_eq!(relation.sorted_locations, vec!["Paris, France"]);

        // stored copy keeps the upstream keys
        assert!(store.relations()[0].dates_locations.contains_key("paris-france"));
        assert!(store.relation_by_id(999).is_err());
    }

    #[test]
    fn test_artist_details() {
        let store = populated_store();
        let details = store.artist_details(1).unwrap();
        assert_eq!(details.artist.id, 1);
        assert_eq!(details.relations.sorted_locations.len(), 1);

        // artist 2 exists but has no locations entry
        assert_eq!(
            store.artist_details(2).unwrap_err(),
            CatalogError::NotFound {
                kind: ResourceKind::Locations,
                id: 2
            }
        );
    }
}
