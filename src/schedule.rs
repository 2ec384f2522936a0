//! The fixed 16-segment competition structure all scraped results are
//! normalized into: 8 running legs interleaved with 8 functional stations.

/// One slot of the canonical schedule.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleSlot {
    pub name: &'static str,
    /// 1-based position in the race.
    pub order_index: u8,
    /// Placeholder duration used when the fill-default policy is active.
    pub default_duration_seconds: f64,
}

pub const EXPECTED_EVENT_COUNT: usize = 16;

pub static CANONICAL_SCHEDULE: [ScheduleSlot; EXPECTED_EVENT_COUNT] = [
    slot("Running 1", 1, 190.0),
    slot("1000m SkiErg", 2, 195.0),
    slot("Running 2", 3, 195.0),
    slot("50m Sled Push", 4, 80.0),
    slot("Running 3", 5, 200.0),
    slot("50m Sled Pull", 6, 90.0),
    slot("Running 4", 7, 200.0),
    slot("80m Burpee Broad Jump", 8, 230.0),
    slot("Running 5", 9, 205.0),
    slot("1000m Row", 10, 205.0),
    slot("Running 6", 11, 205.0),
    slot("200m Farmers Carry", 12, 190.0),
    slot("Running 7", 13, 210.0),
    slot("100m Sandbag Lunges", 14, 260.0),
    slot("Running 8", 15, 215.0),
    slot("Wall Balls", 16, 480.0),
];

const fn slot(name: &'static str, order_index: u8, default_duration_seconds: f64) -> ScheduleSlot {
    ScheduleSlot {
        name,
        order_index,
        default_duration_seconds,
    }
}

/// Label alias table: site spellings seen in the wild, in scan order.
/// More specific aliases come first so the substring fallback cannot be
/// shadowed by a broader key.
static LABEL_ALIASES: &[(&str, u8)] = &[
    ("Running 1", 1),
    ("Running 2", 3),
    ("Running 3", 5),
    ("Running 4", 7),
    ("Running 5", 9),
    ("Running 6", 11),
    ("Running 7", 13),
    ("Running 8", 15),
    ("1000m SkiErg", 2),
    ("1km SkiErg", 2),
    ("Ski Erg", 2),
    ("50m Sled Push", 4),
    ("Sled Push", 4),
    ("50m Sled Pull", 6),
    ("Sled Pull", 6),
    ("80m Burpee Broad Jump", 8),
    ("Burpee Broad Jumps", 8),
    ("1000m Row", 10),
    ("1000m Rowing", 10),
    ("100m Rowing", 10),
    ("200m Farmers Carry", 12),
    ("Farmers Carry", 12),
    ("100m Sandbag Lunges", 14),
    ("Sandbag Lunges", 14),
    ("100 Wall Balls", 16),
    ("75 Wall Balls", 16),
    ("Wall Balls", 16),
];

/// Maps a raw site label to its canonical slot: exact alias hit first, then a
/// case-insensitive substring scan in either direction. `None` means the
/// label has no canonical counterpart and should be dropped.
pub fn canonical_slot_for_label(raw_label: &str) -> Option<&'static ScheduleSlot> {
    let trimmed = raw_label.trim();
    if trimmed.is_empty() {
        return None;
    }

    let order_index = LABEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == trimmed)
        .or_else(|| {
            let lower = trimmed.to_lowercase();
            LABEL_ALIASES.iter().find(|(alias, _)| {
                let alias_lower = alias.to_lowercase();
                lower.contains(&alias_lower) || alias_lower.contains(&lower)
            })
        })
        .map(|(_, order_index)| *order_index)?;

    CANONICAL_SCHEDULE
        .iter()
        .find(|slot| slot.order_index == order_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_covers_sixteen_strictly_increasing_slots() {
        assert_eq!(CANONICAL_SCHEDULE.len(), EXPECTED_EVENT_COUNT);
        for (i, slot) in CANONICAL_SCHEDULE.iter().enumerate() {
            assert_eq!(slot.order_index as usize, i + 1);
            assert!(slot.default_duration_seconds > 0.0);
        }
    }

    #[test]
    fn exact_alias_wins() {
        let slot = canonical_slot_for_label("Running 3").unwrap();
        assert_eq!(slot.order_index, 5);
        assert_eq!(canonical_slot_for_label("1000m SkiErg").unwrap().order_index, 2);
    }

    #[test]
    fn substring_fallback_maps_site_variants() {
        // label contains an alias
        assert_eq!(
            canonical_slot_for_label("100 Wall Balls (9kg)").unwrap().order_index,
            16
        );
        // alias contains the label
        assert_eq!(canonical_slot_for_label("sled push").unwrap().order_index, 4);
        assert_eq!(canonical_slot_for_label("BURPEE BROAD JUMPS").unwrap().order_index, 8);
    }

    #[test]
    fn unknown_labels_are_unmapped() {
        assert!(canonical_slot_for_label("Roxzone").is_none());
        assert!(canonical_slot_for_label("").is_none());
    }
}
