use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Competitor link discovered on a roster page. Lives only for the duration
/// of one ingestion pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAthleteReference {
    pub name: String,
    pub external_id: String,
    pub detail_url: String,
}

/// One table row from an athlete detail page, before any normalization.
/// The label is free text from the source and may not match canonical names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEventEntry {
    pub event_label: String,
    pub time_text: String,
    pub place_text: String,
}

/// Division assignment derived from display text. Best-effort only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Men,
    Women,
    Mixed,
}

impl Category {
    /// Coarse heuristic over the athlete's display name/metadata. Checks the
    /// women tokens first since "women" contains "men". Defaults to Mixed.
    pub fn from_display_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("women") || lower.contains("female") || lower.contains("(w") {
            Category::Women
        } else if lower.contains("men") || lower.contains("male") || lower.contains("(m") {
            Category::Men
        } else {
            Category::Mixed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Men => "men",
            Category::Women => "women",
            Category::Mixed => "mixed",
        }
    }
}

/// One segment of the normalized result, pinned to a canonical slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalEvent {
    pub name: String,
    pub duration_seconds: f64,
    /// Position in the canonical schedule, 1..=16.
    pub order_index: u8,
    /// Cumulative elapsed time at the end of this segment.
    pub split_time_seconds: f64,
}

/// The durable unit handed to the caller's store after transformation.
/// Deserialization is lenient on purpose: absent fields become defaults the
/// quality validator then flags, rather than hard parse errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthleteRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// `None` when the source gave nothing to derive a division from.
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub total_time_seconds: f64,
    #[serde(default)]
    pub ranking: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub location: Option<String>,
    /// Ordered by `order_index` ascending.
    #[serde(default)]
    pub events: Vec<CanonicalEvent>,
    #[serde(default = "Utc::now")]
    pub scraped_at: DateTime<Utc>,
}
