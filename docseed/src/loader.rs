//! Loader orchestrator
//!
//! # State Progression
//! IDLE → CONNECTING → LOADING/NORMALIZING (each entity) → SYNCING (each entity) → DONE
//!
//! Any failure moves to FAILED and aborts the run. Every fixture is loaded
//! before the first delete, so a malformed fixture leaves the store untouched.
//! Each entity's delete-then-insert is independent and safe to re-run; the
//! run as a whole is not transactional.

use crate::fixture::{load_fixture, IdPolicy, PreparedFixture};
use crate::store::{self, DocumentStore};
use docseed_common::config::EntitySpec;
use docseed_common::Result;
use futures::future::try_join_all;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Loader run state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Connecting,
    Loading(String),
    Normalizing(String),
    Syncing(String),
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "IDLE"),
            Phase::Connecting => write!(f, "CONNECTING"),
            Phase::Loading(entity) => write!(f, "LOADING({})", entity),
            Phase::Normalizing(entity) => write!(f, "NORMALIZING({})", entity),
            Phase::Syncing(entity) => write!(f, "SYNCING({})", entity),
            Phase::Done => write!(f, "DONE"),
            Phase::Failed => write!(f, "FAILED"),
        }
    }
}

/// Behavior switches for a run
#[derive(Debug, Clone, Copy, Default)]
pub struct LoaderOptions {
    pub id_policy: IdPolicy,
    /// Sync entity types concurrently
    pub parallel: bool,
    /// Load and normalize only; never connect to the store
    pub dry_run: bool,
}

/// Per-entity result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySummary {
    pub entity: String,
    pub collection: String,
    pub deleted: u64,
    pub inserted: u64,
}

/// Result of a completed run, entities in configured order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub entities: Vec<EntitySummary>,
    pub dry_run: bool,
}

impl SeedSummary {
    pub fn get(&self, entity: &str) -> Option<&EntitySummary> {
        self.entities.iter().find(|e| e.entity == entity)
    }

    pub fn total_inserted(&self) -> u64 {
        self.entities.iter().map(|e| e.inserted).sum()
    }

    pub fn total_deleted(&self) -> u64 {
        self.entities.iter().map(|e| e.deleted).sum()
    }

    /// One-line summary, e.g. "deleted: users=3, hotels=2"
    pub fn display_string(&self) -> String {
        let deleted: Vec<String> = self
            .entities
            .iter()
            .map(|e| format!("{}={}", e.entity, e.deleted))
            .collect();
        let inserted: Vec<String> = self
            .entities
            .iter()
            .map(|e| format!("{}={}", e.entity, e.inserted))
            .collect();

        let verb = if self.dry_run { "would seed" } else { "seeded" };
        format!(
            "deleted: {}; {}: {}",
            deleted.join(", "),
            verb,
            inserted.join(", ")
        )
    }
}

/// Fixture loader bound to one store connection string
pub struct Loader {
    connection_string: String,
    data_dir: PathBuf,
    entities: Vec<EntitySpec>,
    options: LoaderOptions,
}

impl Loader {
    pub fn new(
        connection_string: impl Into<String>,
        data_dir: impl Into<PathBuf>,
        entities: Vec<EntitySpec>,
        options: LoaderOptions,
    ) -> Self {
        Self {
            connection_string: connection_string.into(),
            data_dir: data_dir.into(),
            entities,
            options,
        }
    }

    fn enter(&self, phase: Phase) {
        debug!("Loader phase: {}", phase);
    }

    /// Run the whole seed: connect, load every fixture, sync every entity
    ///
    /// The connection is closed on success and on failure. Errors are
    /// returned, not logged; reporting them is up to the caller.
    pub async fn run(&self) -> Result<SeedSummary> {
        self.enter(Phase::Idle);

        if self.options.dry_run {
            info!("Dry run: the store will not be contacted");
            let result = self.plan().await;
            return self.finish(result);
        }

        self.enter(Phase::Connecting);
        let store = match store::connect(&self.connection_string).await {
            Ok(store) => store,
            Err(e) => return self.finish(Err(e)),
        };
        info!("✓ Connected to document store ({})", store.backend());

        let result = self.seed(store.as_ref()).await;
        store.close().await;
        self.finish(result)
    }

    fn finish(&self, result: Result<SeedSummary>) -> Result<SeedSummary> {
        match &result {
            Ok(_) => self.enter(Phase::Done),
            Err(e) => {
                self.enter(Phase::Failed);
                debug!("Run aborted: {}", e);
            }
        }
        result
    }

    /// Seed through an already-open store
    pub async fn seed(&self, store: &dyn DocumentStore) -> Result<SeedSummary> {
        let fixtures = self.load_all().await?;

        let entities = if self.options.parallel {
            try_join_all(fixtures.iter().map(|fixture| self.sync_entity(store, fixture))).await?
        } else {
            let mut entities = Vec::with_capacity(fixtures.len());
            for fixture in &fixtures {
                entities.push(self.sync_entity(store, fixture).await?);
            }
            entities
        };

        let summary = SeedSummary {
            entities,
            dry_run: false,
        };
        info!("✓ {}", summary.display_string());
        Ok(summary)
    }

    /// Load and normalize every fixture without touching a store
    pub async fn plan(&self) -> Result<SeedSummary> {
        let fixtures = self.load_all().await?;

        let summary = SeedSummary {
            entities: fixtures
                .iter()
                .map(|fixture| EntitySummary {
                    entity: fixture.entity.name.clone(),
                    collection: fixture.entity.collection().to_string(),
                    deleted: 0,
                    inserted: fixture.documents.len() as u64,
                })
                .collect(),
            dry_run: true,
        };
        info!("✓ {}", summary.display_string());
        Ok(summary)
    }

    async fn load_all(&self) -> Result<Vec<PreparedFixture>> {
        let mut fixtures = Vec::with_capacity(self.entities.len());
        for entity in &self.entities {
            self.enter(Phase::Loading(entity.name.clone()));
            let fixture = load_fixture(entity, &self.data_dir, self.options.id_policy).await?;
            self.enter(Phase::Normalizing(entity.name.clone()));
            info!(
                "{}: {} documents from {}",
                entity.name,
                fixture.documents.len(),
                fixture.path.display()
            );
            fixtures.push(fixture);
        }

        if fixtures.iter().all(|f| f.documents.is_empty()) {
            warn!("No documents found in any fixture; check their contents");
        }

        Ok(fixtures)
    }

    /// Delete then insert for one entity; the insert never starts before the delete finishes
    async fn sync_entity(
        &self,
        store: &dyn DocumentStore,
        fixture: &PreparedFixture,
    ) -> Result<EntitySummary> {
        let entity = &fixture.entity;
        let collection = entity.collection();
        self.enter(Phase::Syncing(entity.name.clone()));

        let deleted = store.delete_all(collection).await?;
        info!("🧹 {}: deleted {} from {}", entity.name, deleted, collection);

        let inserted = if fixture.documents.is_empty() {
            warn!("{}: nothing to insert", entity.name);
            0
        } else {
            store
                .insert_many(collection, &fixture.documents)
                .await
                .map_err(|e| e.into_insertion(&entity.name))?
        };
        info!("{}: inserted {} into {}", entity.name, inserted, collection);

        Ok(EntitySummary {
            entity: entity.name.clone(),
            collection: collection.to_string(),
            deleted,
            inserted,
        })
    }
}
