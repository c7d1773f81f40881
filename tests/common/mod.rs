//! Common test utilities
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tourcat::catalog::CatalogStore;
use tourcat::ingest::{Ingestor, ResourceFetcher, StatusRegister};
use tourcat::models::{Collection, ResourceKind};
use tourcat::scheduler::{RefreshIntervals, RefreshScheduler};
use tourcat::utils::error::FetchError;
use tourcat::utils::retry::RetryConfig;

pub const ARTISTS_JSON: &str = r#"[
  {
    "id": 1,
    "image": "https://groupietrackers.herokuapp.com/api/images/queen.jpeg",
    "name": "Queen",
    "members": ["Freddie Mercury", "Brian May", "John Daecon", "Roger Meddows-Taylor"],
    "creationDate": 1970,
    "firstAlbum": "14-12-1973",
    "locations": "https://groupietrackers.herokuapp.com/api/locations/1",
    "concertDates": "https://groupietrackers.herokuapp.com/api/dates/1",
    "relations": "https://groupietrackers.herokuapp.com/api/relation/1"
  },
  {
    "id": 2,
    "image": "https://groupietrackers.herokuapp.com/api/images/soja.jpeg",
    "name": "SOJA",
    "members": ["Jacob Hemphill", "Bob Jefferson"],
    "creationDate": 1997,
    "firstAlbum": "05-06-2002",
    "locations": "https://groupietrackers.herokuapp.com/api/locations/2",
    "concertDates": "https://groupietrackers.herokuapp.com/api/dates/2",
    "relations": "https://groupietrackers.herokuapp.com/api/relation/2"
  }
]"#;

pub const LOCATIONS_JSON: &str = r#"{"index":[
  {"id": 1, "locations": ["london-uk", "playa_del_carmen-mexico"], "dates": "https://groupietrackers.herokuapp.com/api/dates/1"},
  {"id": 2, "locations": ["santiago-chile"], "dates": "https://groupietrackers.herokuapp.com/api/dates/2"}
]}"#;

pub const DATES_JSON: &str = r#"{"index":[
  {"id": 1, "dates": ["*23-08-2019", "22-08-2019", "*05-12-2019"]},
  {"id": 2, "dates": ["*01-03-2020"]}
]}"#;

pub const RELATIONS_JSON: &str = r#"{"index":[
  {"id": 1, "datesLocations": {"london-uk": ["22-08-2019", "23-08-2019"], "playa_del_carmen-mexico": ["05-12-2019"]}},
  {"id": 2, "datesLocations": {"santiago-chile": ["01-03-2020"]}}
]}"#;

/// Upstream body for `kind`
pub fn fixture_body(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Artists => ARTISTS_JSON,
        ResourceKind::Locations => LOCATIONS_JSON,
        ResourceKind::Dates => DATES_JSON,
        ResourceKind::Relations => RELATIONS_JSON,
    }
}

/// Mount a 200 response with the fixture body for every kind
pub async fn mount_healthy(server: &MockServer) {
    for kind in ResourceKind::ALL {
        mount_healthy_kind(server, kind).await;
    }
}

pub async fn mount_healthy_kind(server: &MockServer, kind: ResourceKind) {
    Mock::given(method("GET"))
        .and(path(kind.default_path()))
        .respond_with(ResponseTemplate::new(200).set_body_string(fixture_body(kind)))
        .mount(server)
        .await;
}

/// Fetcher controlled by the test: fails while unhealthy or for listed kinds
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    unhealthy: AtomicBool,
    failing: Mutex<HashSet<ResourceKind>>,
    calls: AtomicU32,
}

impl ScriptedFetcher {
    pub fn healthy() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn down() -> Arc<Self> {
        let fetcher = Self::default();
        fetcher.unhealthy.store(true, Ordering::SeqCst);
        Arc::new(fetcher)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    pub fn fail_kind(&self, kind: ResourceKind) {
        self.failing.lock().unwrap().insert(kind);
    }

    /// Number of fetch calls so far, across all kinds
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceFetcher for ScriptedFetcher {
    async fn fetch(&self, kind: ResourceKind, _deadline: Instant) -> Result<Collection, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.unhealthy.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&kind) {
            return Err(FetchError::Status(500));
        }

        Ok(Collection::decode(kind, fixture_body(kind).as_bytes())?)
    }
}

/// Single attempt per fetch task, default timings
pub fn no_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 0,
        ..RetryConfig::default()
    }
}

/// Store, status register and scheduler wired around `fetcher`
pub fn build_scheduler(fetcher: Arc<ScriptedFetcher>, retry: RetryConfig) -> Arc<RefreshScheduler> {
    let store = Arc::new(CatalogStore::new());
    let ingestor = Ingestor::new(fetcher, store, retry);
    Arc::new(RefreshScheduler::new(
        Arc::new(ingestor),
        Arc::new(StatusRegister::new()),
        RefreshIntervals::default(),
    ))
}
