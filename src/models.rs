// Core data structures for the tour catalog

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Artist record as served by the upstream `/api/artists` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Artist {
    pub id: i64,
    pub image: String,
    pub name: String,
    pub members: Vec<String>,
    pub creation_date: i64,
    pub first_album: String, // dd-mm-yyyy
    pub locations: String,   // upstream URL of the matching locations entry
    pub concert_dates: String,
    pub relations: String,
}

/// Tour locations for one artist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Location {
    pub id: i64,
    pub locations: Vec<String>, // raw slugs, e.g. "north_carolina-usa"
    pub dates: String,
}

/// Concert dates for one artist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConcertDates {
    pub id: i64,
    pub dates: Vec<String>, // may carry a leading '*'
}

/// Location → dates cross-reference for one artist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Relation {
    pub id: i64,
    pub dates_locations: HashMap<String, Vec<String>>,

    /// Locations ordered newest first; filled by relation processing, never by upstream
    #[serde(skip_deserializing)]
    pub sorted_locations: Vec<String>,
}

/// Everything the detail view needs for a single artist
#[derive(Debug, Clone, Serialize)]
pub struct ArtistDetails {
    pub artist: Artist,
    pub locations: Location,
    pub dates: ConcertDates,
    pub relations: Relation,
}

/// Upstream wrapper used by every collection except artists
#[derive(Debug, Deserialize)]
struct Index<T> {
    index: Vec<T>,
}

/// The four upstream resource collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Artists,
    Locations,
    Dates,
    Relations,
}

impl ResourceKind {
    /// All kinds, in declaration order
    pub const ALL: [Self; 4] = [Self::Artists, Self::Locations, Self::Dates, Self::Relations];

    /// Name of the fetch operation, used to make error messages self-describing
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Artists => "FetchArtists",
            Self::Locations => "FetchLocations",
            Self::Dates => "FetchDates",
            Self::Relations => "FetchRelations",
        }
    }

    /// Default path below the upstream base URL
    pub fn default_path(&self) -> &'static str {
        match self {
            Self::Artists => "/api/artists",
            Self::Locations => "/api/locations",
            Self::Dates => "/api/dates",
            Self::Relations => "/api/relation",
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Artists => "artists",
            Self::Locations => "locations",
            Self::Dates => "dates",
            Self::Relations => "relations",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded collection for exactly one resource kind
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    Artists(Vec<Artist>),
    Locations(Vec<Location>),
    Dates(Vec<ConcertDates>),
    Relations(Vec<Relation>),
}

impl Collection {
    /// Decode an upstream body into the shape expected for `kind`.
    ///
    /// Artists arrive as a bare JSON array; the other kinds are wrapped in
    /// an object with a single `index` array.
    pub fn decode(kind: ResourceKind, body: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            ResourceKind::Artists => Self::Artists(serde_json::from_slice(body)?),
            ResourceKind::Locations => {
                Self::Locations(serde_json::from_slice::<Index<Location>>(body)?.index)
            }
            ResourceKind::Dates => {
                Self::Dates(serde_json::from_slice::<Index<ConcertDates>>(body)?.index)
            }
            ResourceKind::Relations => {
                Self::Relations(serde_json::from_slice::<Index<Relation>>(body)?.index)
            }
        })
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Artists(_) => ResourceKind::Artists,
            Self::Locations(_) => ResourceKind::Locations,
            Self::Dates(_) => ResourceKind::Dates,
            Self::Relations(_) => ResourceKind::Relations,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Artists(v) => v.len(),
            Self::Locations(v) => v.len(),
            Self::Dates(v) => v.len(),
            Self::Relations(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
