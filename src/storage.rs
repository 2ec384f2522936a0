use crate::domain::{AthleteRecord, Category};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Aggregate counters over the store contents.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total_athletes: usize,
    pub men_count: usize,
    pub women_count: usize,
    pub last_update: Option<DateTime<Utc>>,
}

/// The explicit store the caller owns. The core pipeline only produces
/// records; merging them across runs happens behind this boundary.
#[async_trait]
pub trait AthleteStore: Send + Sync {
    /// Inserts or replaces a record, keyed by athlete name.
    async fn upsert_athlete(&self, record: &AthleteRecord) -> Result<()>;
    async fn get_athlete_by_name(&self, name: &str) -> Result<Option<AthleteRecord>>;
    /// All records, ordered by id.
    async fn load_athletes(&self) -> Result<Vec<AthleteRecord>>;
    async fn stats(&self) -> Result<StoreStats>;
}

/// In-memory store for development and testing.
pub struct InMemoryStore {
    athletes: Arc<Mutex<HashMap<String, AthleteRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            athletes: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AthleteStore for InMemoryStore {
    async fn upsert_athlete(&self, record: &AthleteRecord) -> Result<()> {
        let mut athletes = self.athletes.lock().unwrap();
        let replaced = athletes
            .insert(record.name.to_lowercase(), record.clone())
            .is_some();
        debug!(
            "{} athlete {} in store",
            if replaced { "Replaced" } else { "Created" },
            record.name
        );
        Ok(())
    }

    async fn get_athlete_by_name(&self, name: &str) -> Result<Option<AthleteRecord>> {
        let athletes = self.athletes.lock().unwrap();
        Ok(athletes.get(&name.to_lowercase()).cloned())
    }

    async fn load_athletes(&self) -> Result<Vec<AthleteRecord>> {
        let athletes = self.athletes.lock().unwrap();
        let mut all: Vec<AthleteRecord> = athletes.values().cloned().collect();
        all.sort_by_key(|record| record.id);
        Ok(all)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let athletes = self.athletes.lock().unwrap();
        let men_count = athletes
            .values()
            .filter(|r| r.category == Some(Category::Men))
            .count();
        let women_count = athletes
            .values()
            .filter(|r| r.category == Some(Category::Women))
            .count();
        let last_update = athletes.values().map(|r| r.scraped_at).max();
        Ok(StoreStats {
            total_athletes: athletes.len(),
            men_count,
            women_count,
            last_update,
        })
    }
}
