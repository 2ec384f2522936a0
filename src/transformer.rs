use crate::config::MissingSlotPolicy;
use crate::domain::{AthleteRecord, Category, CanonicalEvent};
use crate::schedule::{canonical_slot_for_label, CANONICAL_SCHEDULE, EXPECTED_EVENT_COUNT};
use crate::timing::ParsedTime;
use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Normalizes raw per-athlete timings into the canonical event sequence:
/// maps site labels to schedule slots, accumulates split times and emits a
/// record ordered by slot, never by encounter order.
pub struct ResultTransformer {
    missing_slot_policy: MissingSlotPolicy,
}

impl ResultTransformer {
    pub fn new(missing_slot_policy: MissingSlotPolicy) -> Self {
        Self {
            missing_slot_policy,
        }
    }

    pub fn transform(
        &self,
        athlete_id: i64,
        raw_name: &str,
        raw_events: &HashMap<String, ParsedTime>,
    ) -> AthleteRecord {
        let mut slot_durations: [Option<f64>; EXPECTED_EVENT_COUNT] = [None; EXPECTED_EVENT_COUNT];

        for (label, parsed) in raw_events {
            let Some(slot) = canonical_slot_for_label(label) else {
                warn!("Unmapped event label dropped: {label:?}");
                continue;
            };
            let cell = &mut slot_durations[slot.order_index as usize - 1];
            if cell.is_some() {
                warn!(
                    "Multiple labels mapped onto slot {} ({}), keeping the first",
                    slot.order_index, slot.name
                );
                continue;
            }
            debug!("Mapped {label:?} -> slot {} ({})", slot.order_index, slot.name);
            *cell = Some(parsed.seconds);
        }

        let mut events = Vec::with_capacity(EXPECTED_EVENT_COUNT);
        let mut split_time = 0.0;
        for slot in CANONICAL_SCHEDULE.iter() {
            let duration = match slot_durations[slot.order_index as usize - 1] {
                Some(seconds) => seconds,
                None => match self.missing_slot_policy {
                    MissingSlotPolicy::FillDefault => {
                        debug!(
                            "No scraped time for {}, filling default {}s",
                            slot.name, slot.default_duration_seconds
                        );
                        slot.default_duration_seconds
                    }
                    MissingSlotPolicy::Omit => continue,
                },
            };
            split_time += duration;
            events.push(CanonicalEvent {
                name: slot.name.to_string(),
                duration_seconds: duration,
                order_index: slot.order_index,
                split_time_seconds: split_time,
            });
        }

        let total_time_seconds = events.iter().map(|e| e.duration_seconds).sum();

        AthleteRecord {
            id: athlete_id,
            name: raw_name.trim().to_string(),
            category: Some(Category::from_display_text(raw_name)),
            total_time_seconds,
            ranking: None,
            year: None,
            location: None,
            events,
            scraped_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::TimingParser;

    fn raw(entries: &[(&str, &str)]) -> HashMap<String, ParsedTime> {
        entries
            .iter()
            .map(|(label, time)| {
                (
                    label.to_string(),
                    TimingParser::cleanse_scraped(time, label).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn emits_canonical_order_with_running_splits() {
        let transformer = ResultTransformer::new(MissingSlotPolicy::FillDefault);
        let raw_events = raw(&[
            ("Wall Balls", "8:30"),
            ("Running 1", "4:10"),
            ("1000m SkiErg", "3:45"),
        ]);

        let record = transformer.transform(1, "Test Athlete", &raw_events);

        assert_eq!(record.events.len(), 16);
        for window in record.events.windows(2) {
            assert!(window[0].order_index < window[1].order_index);
            assert!(window[0].split_time_seconds <= window[1].split_time_seconds);
        }
        assert_eq!(record.events[0].duration_seconds, 250.0);
        assert_eq!(record.events[1].duration_seconds, 225.0);
        assert_eq!(record.events[15].duration_seconds, 510.0);
        // an unfilled slot takes the schedule default under this policy
        assert_eq!(record.events[3].duration_seconds, 80.0);

        let sum: f64 = record.events.iter().map(|e| e.duration_seconds).sum();
        assert!((record.total_time_seconds - sum).abs() < 1e-9);
        assert!(
            (record.events.last().unwrap().split_time_seconds - record.total_time_seconds).abs()
                < 1e-9
        );
    }

    #[test]
    fn omit_policy_drops_unfilled_slots() {
        let transformer = ResultTransformer::new(MissingSlotPolicy::Omit);
        let raw_events = raw(&[("Running 2", "4:30"), ("50m Sled Push", "1:30")]);

        let record = transformer.transform(2, "Test Athlete", &raw_events);

        assert_eq!(record.events.len(), 2);
        assert_eq!(record.events[0].order_index, 3);
        assert_eq!(record.events[1].order_index, 4);
        assert_eq!(record.total_time_seconds, 270.0 + 90.0);
        assert_eq!(record.events[1].split_time_seconds, 360.0);
    }

    #[test]
    fn unmapped_labels_are_dropped_not_fatal() {
        let transformer = ResultTransformer::new(MissingSlotPolicy::Omit);
        let raw_events = raw(&[("Roxzone", "6:00"), ("Running 1", "4:00")]);

        let record = transformer.transform(3, "Test Athlete", &raw_events);
        assert_eq!(record.events.len(), 1);
        assert_eq!(record.events[0].name, "Running 1");
    }

    #[test]
    fn category_comes_from_display_text() {
        let transformer = ResultTransformer::new(MissingSlotPolicy::Omit);
        let raw_events = raw(&[("Running 1", "4:00")]);

        let record = transformer.transform(4, "Jane Doe (Women Pro)", &raw_events);
        assert_eq!(record.category, Some(Category::Women));

        let record = transformer.transform(5, "Somebody", &raw_events);
        assert_eq!(record.category, Some(Category::Mixed));
    }
}
