use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A successfully normalized duration. Failed parses are `None` at the call
/// site, never a zero value, so a missing result cannot masquerade as a
/// genuine zero-second split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTime {
    pub original_text: String,
    pub cleaned_text: String,
    /// Always positive, rounded to 2 decimals.
    pub seconds: f64,
    /// Advisory only; out-of-band values are still returned.
    pub is_plausible: bool,
}

/// Recognized time shapes, tried in priority order. First match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeFormat {
    HoursMinutesSecondsFraction,
    HoursMinutesSeconds,
    MinutesSecondsFraction,
    MinutesSeconds,
    SecondsFraction,
    BareSeconds,
}

static TIME_PATTERNS: Lazy<Vec<(TimeFormat, Regex)>> = Lazy::new(|| {
    vec![
        (
            TimeFormat::HoursMinutesSecondsFraction,
            Regex::new(r"^(\d{1,2}):(\d{2}):(\d{2})\.(\d+)$").unwrap(),
        ),
        (
            TimeFormat::HoursMinutesSeconds,
            Regex::new(r"^(\d{1,2}):(\d{2}):(\d{2})$").unwrap(),
        ),
        (
            TimeFormat::MinutesSecondsFraction,
            Regex::new(r"^(\d{1,2}):(\d{2})\.(\d+)$").unwrap(),
        ),
        (
            TimeFormat::MinutesSeconds,
            Regex::new(r"^(\d{1,2}):(\d{2})$").unwrap(),
        ),
        (
            TimeFormat::SecondsFraction,
            Regex::new(r"^(\d{1,3})\.(\d+)$").unwrap(),
        ),
        (TimeFormat::BareSeconds, Regex::new(r"^(\d{1,4})$").unwrap()),
    ]
});

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Expected duration bands per station, seconds. Matched by case-insensitive
/// substring so both raw labels ("Running 3") and canonical names ("1km Run")
/// resolve. Unknown labels are always plausible.
static EXPECTED_DURATIONS: &[(&str, f64, f64)] = &[
    ("skierg", 180.0, 600.0),
    ("sled push", 30.0, 300.0),
    ("sled pull", 30.0, 300.0),
    ("burpee", 180.0, 900.0),
    ("row", 180.0, 600.0),
    ("farmer", 60.0, 400.0),
    ("lunge", 120.0, 600.0),
    ("wall ball", 180.0, 900.0),
    ("run", 180.0, 900.0),
];

const DASHES: [char; 3] = ['-', '\u{2013}', '\u{2014}'];

/// Converts heterogeneous human-entered time text into seconds with
/// millisecond precision.
pub struct TimingParser;

impl TimingParser {
    /// Parses a raw time string. `None` means "no value", including any
    /// result of zero or negative seconds.
    pub fn parse(text: &str) -> Option<ParsedTime> {
        let cleaned = collapse_whitespace(text);
        if cleaned.is_empty() {
            return None;
        }
        let seconds = Self::parse_seconds(&cleaned)?;
        Some(ParsedTime {
            original_text: text.to_string(),
            cleaned_text: cleaned,
            seconds: round2(seconds),
            is_plausible: true,
        })
    }

    /// Pre-cleans scraped cell text before parsing. A single boundary dash is
    /// stripped; any dash remaining after that encodes "no result" on the
    /// source site and fails the parse.
    pub fn cleanse_scraped(time_text: &str, event_label: &str) -> Option<ParsedTime> {
        let trimmed = time_text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let mut s = trimmed;
        if let Some(rest) = s.strip_prefix(&DASHES[..]) {
            s = rest.trim_start();
        } else if let Some(rest) = s.strip_suffix(&DASHES[..]) {
            s = rest.trim_end();
        }
        if s.contains(&DASHES[..]) {
            debug!("Dash-marked no-result for {event_label}: {time_text:?}");
            return None;
        }

        let cleaned: String = s
            .chars()
            .filter(|c| c.is_ascii_digit() || matches!(c, ':' | ',' | '.'))
            .map(|c| if c == ',' { '.' } else { c })
            .collect();

        if cleaned.is_empty() || cleaned.chars().all(|c| c == '.' || c == ':') {
            return None;
        }

        let seconds = match Self::parse_seconds(&cleaned) {
            Some(s) => round2(s),
            None => {
                warn!("Invalid parsed time for {event_label}: {time_text:?}");
                return None;
            }
        };

        let is_plausible = Self::validate_event_time(event_label, seconds);
        if !is_plausible {
            warn!("Suspicious time for {event_label}: {seconds}s");
        }

        Some(ParsedTime {
            original_text: time_text.to_string(),
            cleaned_text: cleaned,
            seconds,
            is_plausible,
        })
    }

    /// Checks a duration against the station's expected band. Advisory: a
    /// `false` here never rejects the value.
    pub fn validate_event_time(event_label: &str, seconds: f64) -> bool {
        let lower = event_label.to_lowercase();
        match EXPECTED_DURATIONS
            .iter()
            .find(|(token, _, _)| lower.contains(token))
        {
            Some((_, min, max)) => seconds >= *min && seconds <= *max,
            None => true,
        }
    }

    fn parse_seconds(cleaned: &str) -> Option<f64> {
        for (format, pattern) in TIME_PATTERNS.iter() {
            if let Some(caps) = pattern.captures(cleaned) {
                let seconds = Self::convert_match(*format, &caps);
                return (seconds > 0.0).then_some(seconds);
            }
        }

        debug!("Unrecognized time format, attempting fallback parsing: {cleaned:?}");
        let seconds = Self::fallback_conversion(cleaned)?;
        (seconds > 0.0).then_some(seconds)
    }

    fn convert_match(format: TimeFormat, caps: &regex::Captures<'_>) -> f64 {
        let group = |i: usize| -> f64 {
            caps.get(i)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .unwrap_or(0) as f64
        };

        match format {
            TimeFormat::HoursMinutesSecondsFraction => {
                group(1) * 3600.0
                    + group(2) * 60.0
                    + group(3)
                    + normalize_milliseconds(caps.get(4).map_or("", |m| m.as_str())) / 1000.0
            }
            TimeFormat::HoursMinutesSeconds => group(1) * 3600.0 + group(2) * 60.0 + group(3),
            TimeFormat::MinutesSecondsFraction => {
                group(1) * 60.0
                    + group(2)
                    + normalize_milliseconds(caps.get(3).map_or("", |m| m.as_str())) / 1000.0
            }
            TimeFormat::MinutesSeconds => group(1) * 60.0 + group(2),
            TimeFormat::SecondsFraction => {
                group(1) + normalize_milliseconds(caps.get(2).map_or("", |m| m.as_str())) / 1000.0
            }
            TimeFormat::BareSeconds => group(1),
        }
    }

    /// Last-ditch conversion: interpret the digit runs positionally.
    fn fallback_conversion(cleaned: &str) -> Option<f64> {
        let runs: Vec<f64> = DIGIT_RUN
            .find_iter(cleaned)
            .filter_map(|m| m.as_str().parse::<u32>().ok())
            .map(|n| n as f64)
            .collect();

        match runs.len() {
            0 => None,
            1 => Some(runs[0]),
            2 => Some(runs[0] * 60.0 + runs[1]),
            _ => Some(runs[0] * 3600.0 + runs[1] * 60.0 + runs[2]),
        }
    }
}

/// A 1-digit fraction means tenths, 2 digits hundredths, 3 digits is used
/// as-is; anything longer is truncated to its first 3 digits.
fn normalize_milliseconds(fraction: &str) -> f64 {
    let value = |s: &str| s.parse::<u32>().unwrap_or(0) as f64;
    match fraction.len() {
        0 => 0.0,
        1 => value(fraction) * 100.0,
        2 => value(fraction) * 10.0,
        3 => value(fraction),
        _ => value(&fraction[..3]),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn round2(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seconds_of(text: &str) -> f64 {
        TimingParser::parse(text).unwrap().seconds
    }

    #[test]
    fn parses_minutes_seconds() {
        assert_eq!(seconds_of("4:32"), 272.0);
    }

    #[test]
    fn parses_hours_minutes_seconds() {
        assert_eq!(seconds_of("1:05:23"), 3923.0);
    }

    #[test]
    fn parses_fractional_seconds() {
        assert_eq!(seconds_of("4:32.5"), 272.5);
        assert_eq!(seconds_of("1:02:03.250"), 3723.25);
        assert_eq!(seconds_of("95.25"), 95.25);
        assert_eq!(seconds_of("847"), 847.0);
    }

    #[test]
    fn normalizes_fraction_widths() {
        // tenths, hundredths, milliseconds, truncated
        assert_eq!(seconds_of("4:32.5"), 272.5);
        assert_eq!(seconds_of("4:32.50"), 272.5);
        assert_eq!(seconds_of("4:32.500"), 272.5);
        assert_eq!(TimingParser::parse_seconds("4:32.5009").unwrap(), 272.5);
    }

    #[test]
    fn rejects_empty_and_non_numeric() {
        assert!(TimingParser::parse("").is_none());
        assert!(TimingParser::parse("   ").is_none());
        assert!(TimingParser::parse("DNF").is_none());
        assert!(TimingParser::parse("---").is_none());
    }

    #[test]
    fn zero_is_no_value_not_success() {
        assert!(TimingParser::parse("0").is_none());
        assert!(TimingParser::parse("0:00").is_none());
    }

    #[test]
    fn fallback_reads_digit_runs_positionally() {
        assert_eq!(seconds_of("4m 32s"), 272.0);
        assert_eq!(seconds_of("1h 5m 23s"), 3923.0);
        assert_eq!(seconds_of("about 300"), 300.0);
    }

    #[test]
    fn round_trip_is_stable() {
        for text in ["4:32", "1:05:23", "58", "12:03", "7:45.2"] {
            let first = seconds_of(text);
            let whole = first.trunc() as u64;
            let frac = first - first.trunc();
            let formatted = if whole >= 3600 {
                format!("{}:{:02}:{:02}", whole / 3600, (whole % 3600) / 60, whole % 60)
            } else {
                format!("{}:{:02}", whole / 60, whole % 60)
            };
            let second = seconds_of(&formatted) + frac;
            assert!((first - second).abs() < 0.001, "{text} drifted");
        }
    }

    #[test]
    fn cleanse_strips_noise_characters() {
        let parsed = TimingParser::cleanse_scraped(" 4:32 \u{a0}", "Running 1").unwrap();
        assert_eq!(parsed.seconds, 272.0);
        assert_eq!(parsed.cleaned_text, "4:32");
    }

    #[test]
    fn cleanse_normalizes_comma_decimal() {
        let comma = TimingParser::cleanse_scraped("4,32", "Running 1").unwrap();
        let period = TimingParser::cleanse_scraped("4.32", "Running 1").unwrap();
        assert_eq!(comma.seconds, period.seconds);
    }

    #[test]
    fn cleanse_allows_single_boundary_dash() {
        let parsed = TimingParser::cleanse_scraped("- 4:32", "Running 1").unwrap();
        assert_eq!(parsed.seconds, 272.0);
    }

    #[test]
    fn cleanse_rejects_remaining_dashes_as_no_result() {
        assert!(TimingParser::cleanse_scraped("\u{2013}4:32\u{2013}", "Running 1").is_none());
        assert!(TimingParser::cleanse_scraped("4\u{2013}32", "Running 1").is_none());
        assert!(TimingParser::cleanse_scraped("\u{2013}", "Running 1").is_none());
    }

    #[test]
    fn cleanse_rejects_punctuation_only_residue() {
        assert!(TimingParser::cleanse_scraped("n/a", "Running 1").is_none());
        assert!(TimingParser::cleanse_scraped("..", "Running 1").is_none());
        assert!(TimingParser::cleanse_scraped("::", "Running 1").is_none());
    }

    #[test]
    fn plausibility_is_advisory() {
        let parsed = TimingParser::cleanse_scraped("25:00", "50m Sled Push").unwrap();
        assert_eq!(parsed.seconds, 1500.0);
        assert!(!parsed.is_plausible);
    }

    #[test]
    fn plausibility_bands_match_stations() {
        assert!(TimingParser::validate_event_time("Running 4", 272.0));
        assert!(!TimingParser::validate_event_time("Running 4", 100.0));
        assert!(TimingParser::validate_event_time("50m Sled Push", 75.0));
        assert!(!TimingParser::validate_event_time("1000m SkiErg", 1000.0));
        // unknown stations are always plausible
        assert!(TimingParser::validate_event_time("Transition", 5.0));
    }
}
