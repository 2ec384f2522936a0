use crate::domain::AthleteRecord;
use serde::Serialize;

/// Score penalties and plausibility bounds. These are heuristic tuning knobs,
/// not invariants, so they live in one overridable place.
#[derive(Debug, Clone)]
pub struct ScoreWeights {
    pub error_penalty: i32,
    pub warning_penalty: i32,
    pub missing_event_penalty: i32,
    pub suspicious_event_penalty: i32,
    pub total_mismatch_penalty: i32,
    pub expected_event_count: usize,
    /// Generous per-event duration band, seconds.
    pub duration_band: (f64, f64),
    /// Allowed drift between stated total and the event sum, seconds.
    pub total_tolerance_seconds: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            error_penalty: 25,
            warning_penalty: 10,
            missing_event_penalty: 3,
            suspicious_event_penalty: 5,
            total_mismatch_penalty: 10,
            expected_event_count: 16,
            duration_band: (30.0, 1800.0),
            total_tolerance_seconds: 60.0,
        }
    }
}

/// Shape-level validation outcome.
#[derive(Debug, Clone, Serialize)]
pub struct StructureReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub score: u8,
}

/// Timing-level validation outcome, reported regardless of pass/fail.
#[derive(Debug, Clone, Serialize)]
pub struct TimingReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub completeness: CompletenessSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletenessSummary {
    pub observed_event_count: usize,
    pub expected_event_count: usize,
    pub has_ski_erg: bool,
    pub has_sled_push: bool,
    pub has_sled_pull: bool,
    pub has_burpees: bool,
    pub has_wall_balls: bool,
}

/// Combined report. Always recomputable from the record; advisory only and
/// never blocks the record from being returned.
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub is_structurally_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub score: u8,
    pub timing_issues: Vec<String>,
    pub completeness: CompletenessSummary,
}

impl QualityReport {
    /// Actionable advice derived from the findings, mirroring what an
    /// operator would be told after a low-quality scrape.
    pub fn recommendations(&self) -> Vec<String> {
        let mut recommendations = Vec::new();
        if !self.is_structurally_valid {
            recommendations.push(format!(
                "Fix data structure issues: {}",
                self.errors.join("; ")
            ));
        }
        if !self.warnings.is_empty() {
            recommendations.push(format!(
                "Address data quality warnings: {}",
                self.warnings.join("; ")
            ));
        }
        if !self.timing_issues.is_empty() {
            recommendations.push(format!(
                "Review event timing data: {}",
                self.timing_issues.join("; ")
            ));
        }
        if self.score < 70 {
            recommendations.push(format!(
                "Consider re-scraping this athlete (quality score {}/100)",
                self.score
            ));
        }
        recommendations
    }
}

/// Aggregate view over a batch validation run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub valid: usize,
    pub average_score: f64,
}

/// Pure, deterministic record inspection. No I/O, safe to call repeatedly.
pub struct QualityValidator {
    weights: ScoreWeights,
}

/// Mandatory component families checked by substring against event names.
static MAJOR_COMPONENTS: &[(&str, &str)] = &[
    ("skierg", "SkiErg"),
    ("sled push", "Sled Push"),
    ("sled pull", "Sled Pull"),
    ("burpee", "Burpee Broad Jump"),
    ("wall ball", "Wall Balls"),
];

impl QualityValidator {
    pub fn new() -> Self {
        Self {
            weights: ScoreWeights::default(),
        }
    }

    pub fn with_weights(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn validate_structure(&self, record: &AthleteRecord) -> StructureReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if record.name.trim().is_empty() {
            errors.push("Missing or invalid athlete name".to_string());
        }
        if record.id <= 0 {
            errors.push("Missing athlete ID".to_string());
        }
        if record.category.is_none() {
            warnings.push("Missing or invalid category".to_string());
        }
        if !record.total_time_seconds.is_finite() || record.total_time_seconds <= 0.0 {
            errors.push("Missing or invalid total time".to_string());
        }
        for (index, event) in record.events.iter().enumerate() {
            if event.name.trim().is_empty() {
                errors.push(format!("Event {}: Missing event name", index + 1));
            }
            if !event.duration_seconds.is_finite() || event.duration_seconds <= 0.0 {
                errors.push(format!("Event {}: Invalid duration", index + 1));
            }
        }

        let score = self.calculate_score(record, &errors, &warnings);

        StructureReport {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            score,
        }
    }

    pub fn validate_timing(&self, record: &AthleteRecord) -> TimingReport {
        let mut issues = Vec::new();

        if record.events.is_empty() {
            return TimingReport {
                is_valid: false,
                issues: vec!["No events to validate".to_string()],
                completeness: self.completeness(record),
            };
        }

        let mut seen = std::collections::HashSet::new();
        for event in &record.events {
            if !seen.insert(event.name.as_str()) {
                issues.push(format!("Duplicate event: {}", event.name));
            }
        }

        let completeness = self.completeness(record);
        let missing: Vec<&str> = MAJOR_COMPONENTS
            .iter()
            .zip([
                completeness.has_ski_erg,
                completeness.has_sled_push,
                completeness.has_sled_pull,
                completeness.has_burpees,
                completeness.has_wall_balls,
            ])
            .filter(|(_, present)| !present)
            .map(|((_, display), _)| *display)
            .collect();
        if !missing.is_empty() {
            issues.push(format!(
                "Missing {} major components: {}",
                missing.len(),
                missing.join(", ")
            ));
        }

        TimingReport {
            is_valid: issues.is_empty(),
            issues,
            completeness,
        }
    }

    /// Runs both validators and merges their findings.
    pub fn report(&self, record: &AthleteRecord) -> QualityReport {
        let structure = self.validate_structure(record);
        let timing = self.validate_timing(record);
        QualityReport {
            is_structurally_valid: structure.is_valid,
            errors: structure.errors,
            warnings: structure.warnings,
            score: structure.score,
            timing_issues: timing.issues,
            completeness: timing.completeness,
        }
    }

    /// Validates a whole batch, returning per-record reports plus a summary.
    pub fn validate_batch(&self, records: &[AthleteRecord]) -> (Vec<QualityReport>, BatchSummary) {
        let reports: Vec<QualityReport> = records.iter().map(|r| self.report(r)).collect();
        let valid = reports
            .iter()
            .filter(|r| r.is_structurally_valid && r.timing_issues.is_empty())
            .count();
        let average_score = if reports.is_empty() {
            0.0
        } else {
            reports.iter().map(|r| r.score as f64).sum::<f64>() / reports.len() as f64
        };
        (
            reports,
            BatchSummary {
                total: records.len(),
                valid,
                average_score,
            },
        )
    }

    fn completeness(&self, record: &AthleteRecord) -> CompletenessSummary {
        let has = |token: &str| {
            record
                .events
                .iter()
                .any(|e| e.name.to_lowercase().contains(token))
        };
        CompletenessSummary {
            observed_event_count: record.events.len(),
            expected_event_count: self.weights.expected_event_count,
            has_ski_erg: has(MAJOR_COMPONENTS[0].0),
            has_sled_push: has(MAJOR_COMPONENTS[1].0),
            has_sled_pull: has(MAJOR_COMPONENTS[2].0),
            has_burpees: has(MAJOR_COMPONENTS[3].0),
            has_wall_balls: has(MAJOR_COMPONENTS[4].0),
        }
    }

    fn calculate_score(&self, record: &AthleteRecord, errors: &[String], warnings: &[String]) -> u8 {
        let w = &self.weights;
        let mut score = 100i32;

        score -= errors.len() as i32 * w.error_penalty;
        score -= warnings.len() as i32 * w.warning_penalty;

        if record.events.len() < w.expected_event_count {
            let missing = w.expected_event_count - record.events.len();
            score -= missing as i32 * w.missing_event_penalty;
        }

        let (min, max) = w.duration_band;
        let suspicious = record
            .events
            .iter()
            .filter(|e| e.duration_seconds < min || e.duration_seconds > max)
            .count();
        score -= suspicious as i32 * w.suspicious_event_penalty;

        let event_sum: f64 = record.events.iter().map(|e| e.duration_seconds).sum();
        if (event_sum - record.total_time_seconds).abs() > w.total_tolerance_seconds {
            score -= w.total_mismatch_penalty;
        }

        score.clamp(0, 100) as u8
    }
}

impl Default for QualityValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AthleteRecord, Category, CanonicalEvent};
    use crate::schedule::CANONICAL_SCHEDULE;
    use chrono::Utc;

    fn complete_record() -> AthleteRecord {
        let mut split = 0.0;
        let events: Vec<CanonicalEvent> = CANONICAL_SCHEDULE
            .iter()
            .map(|slot| {
                split += slot.default_duration_seconds;
                CanonicalEvent {
                    name: slot.name.to_string(),
                    duration_seconds: slot.default_duration_seconds,
                    order_index: slot.order_index,
                    split_time_seconds: split,
                }
            })
            .collect();
        AthleteRecord {
            id: 1,
            name: "Test Athlete".to_string(),
            category: Some(Category::Men),
            total_time_seconds: split,
            ranking: Some(1),
            year: Some(2025),
            location: Some("Berlin".to_string()),
            events,
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn complete_record_scores_perfect() {
        let validator = QualityValidator::new();
        let report = validator.report(&complete_record());

        assert!(report.is_structurally_valid);
        assert_eq!(report.score, 100);
        assert!(report.timing_issues.is_empty());
        assert!(report.completeness.has_wall_balls);
        assert!(report.recommendations().is_empty());
    }

    #[test]
    fn each_defect_class_lowers_the_score() {
        let validator = QualityValidator::new();

        let mut nameless = complete_record();
        nameless.name = "  ".to_string();
        assert_eq!(validator.validate_structure(&nameless).score, 75);

        let mut uncategorized = complete_record();
        uncategorized.category = None;
        assert_eq!(validator.validate_structure(&uncategorized).score, 90);

        let mut short = complete_record();
        short.events.truncate(14);
        short.total_time_seconds = short.events.iter().map(|e| e.duration_seconds).sum();
        assert_eq!(validator.validate_structure(&short).score, 94);

        let mut slow = complete_record();
        slow.events[0].duration_seconds = 2400.0;
        slow.total_time_seconds += 2400.0 - 190.0;
        assert_eq!(validator.validate_structure(&slow).score, 95);

        let mut mismatched = complete_record();
        mismatched.total_time_seconds += 120.0;
        assert_eq!(validator.validate_structure(&mismatched).score, 90);
    }

    #[test]
    fn score_never_goes_below_zero() {
        let validator = QualityValidator::new();
        let mut wreck = complete_record();
        wreck.name = String::new();
        wreck.id = 0;
        wreck.total_time_seconds = 0.0;
        for event in &mut wreck.events {
            event.name = String::new();
            event.duration_seconds = -1.0;
        }

        let report = validator.validate_structure(&wreck);
        assert!(!report.is_valid);
        assert_eq!(report.score, 0);
    }

    #[test]
    fn timing_flags_duplicates_and_missing_components() {
        let validator = QualityValidator::new();

        let mut record = complete_record();
        record.events[2].name = "Running 1".to_string();
        let report = validator.validate_timing(&record);
        assert!(!report.is_valid);
        assert!(report.issues.iter().any(|i| i.contains("Duplicate event")));

        let mut record = complete_record();
        record.events.retain(|e| !e.name.contains("SkiErg") && !e.name.contains("Wall Balls"));
        let report = validator.validate_timing(&record);
        assert!(!report.is_valid);
        assert!(!report.completeness.has_ski_erg);
        assert!(!report.completeness.has_wall_balls);
        assert!(report.completeness.has_burpees);
        assert!(report
            .issues
            .iter()
            .any(|i| i.contains("Missing 2 major components")));
    }

    #[test]
    fn empty_events_is_reported_not_panicked() {
        let validator = QualityValidator::new();
        let mut record = complete_record();
        record.events.clear();

        let report = validator.validate_timing(&record);
        assert!(!report.is_valid);
        assert_eq!(report.completeness.observed_event_count, 0);
    }

    #[test]
    fn batch_summary_aggregates_scores() {
        let validator = QualityValidator::new();
        let good = complete_record();
        let mut bad = complete_record();
        bad.name = String::new();

        let (reports, summary) = validator.validate_batch(&[good, bad]);
        assert_eq!(reports.len(), 2);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.valid, 1);
        assert!((summary.average_score - 87.5).abs() < f64::EPSILON);
    }

    #[test]
    fn low_score_recommends_rescrape() {
        let validator = QualityValidator::new();
        let mut record = complete_record();
        record.name = String::new();
        record.total_time_seconds = 0.0;

        let report = validator.report(&record);
        assert!(report.score < 70);
        assert!(report
            .recommendations()
            .iter()
            .any(|r| r.contains("re-scraping")));
    }
}
