//! Display helpers for counters, durations and quality levels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Abbreviate a counter the way the app shows it: `1.5万`, `2.3千`, `500`.
pub fn format_count(count: u64) -> String {
    match count {
        c if c >= 10_000 => format!("{:.1}万", c as f64 / 10_000.0),
        c if c >= 1_000 => format!("{:.1}千", c as f64 / 1_000.0),
        c => c.to_string(),
    }
}

/// Seconds as `mm:ss`, or `h:mm:ss` from one hour up.
pub fn format_duration(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Parse `ss`, `mm:ss` or `h:mm:ss` back into seconds.
pub fn parse_duration(text: &str) -> Option<u64> {
    text.trim()
        .split(':')
        .try_fold(0u64, |acc, part| {
            acc.checked_mul(60)?
                .checked_add(part.trim().parse::<u64>().ok()?)
        })
}

/// Video quality (`qn`) levels of the playurl endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum VideoQuality {
    P240,
    P360,
    P480,
    P720,
    P720F60,
    P1080,
    P1080Plus,
    P1080F60,
    FourK,
    Hdr,
    Dolby,
    EightK,
    Other(u32),
}

impl VideoQuality {
    /// Highest level the client asks for.
    pub const HIGHEST: Self = Self::EightK;

    pub fn qn(self) -> u32 {
        match self {
            Self::P240 => 6,
            Self::P360 => 16,
            Self::P480 => 32,
            Self::P720 => 64,
            Self::P720F60 => 74,
            Self::P1080 => 80,
            Self::P1080Plus => 112,
            Self::P1080F60 => 116,
            Self::FourK => 120,
            Self::Hdr => 125,
            Self::Dolby => 126,
            Self::EightK => 127,
            Self::Other(qn) => qn,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::P240 => "240P",
            Self::P360 => "360P",
            Self::P480 => "480P",
            Self::P720 => "720P",
            Self::P720F60 => "720P60",
            Self::P1080 => "1080P",
            Self::P1080Plus => "1080P+",
            Self::P1080F60 => "1080P60",
            Self::FourK => "4K",
            Self::Hdr => "HDR",
            Self::Dolby => "杜比视界",
            Self::EightK => "8K",
            Self::Other(_) => "自动",
        }
    }

    /// Whether the level needs `fourk=1` on the request.
    pub fn needs_fourk(self) -> bool {
        self.qn() >= 120
    }
}

impl From<u32> for VideoQuality {
    fn from(qn: u32) -> Self {
        match qn {
            6 => Self::P240,
            16 => Self::P360,
            32 => Self::P480,
            64 => Self::P720,
            74 => Self::P720F60,
            80 => Self::P1080,
            112 => Self::P1080Plus,
            116 => Self::P1080F60,
            120 => Self::FourK,
            125 => Self::Hdr,
            126 => Self::Dolby,
            127 => Self::EightK,
            other => Self::Other(other),
        }
    }
}

impl From<VideoQuality> for u32 {
    fn from(quality: VideoQuality) -> Self {
        quality.qn()
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0")]
    #[case(500, "500")]
    #[case(999, "999")]
    #[case(1_000, "1.0千")]
    #[case(2_345, "2.3千")]
    #[case(10_000, "1.0万")]
    #[case(15_000, "1.5万")]
    #[case(123_456_789, "12345.7万")]
    fn test_format_count(#[case] count: u64, #[case] expected: &str) {
        assert_eq!(format_count(count), expected);
    }

    #[rstest]
    #[case(0, "00:00")]
    #[case(59, "00:59")]
    #[case(61, "01:01")]
    #[case(3_599, "59:59")]
    #[case(3_600, "1:00:00")]
    #[case(36_061, "10:01:01")]
    fn test_format_duration(#[case] secs: u64, #[case] expected: &str) {
        assert_eq!(format_duration(secs), expected);
    }

    #[rstest]
    #[case("42", Some(42))]
    #[case("03:25", Some(205))]
    #[case("1:00:01", Some(3601))]
    #[case("", None)]
    #[case("ab:cd", None)]
    fn test_parse_duration(#[case] text: &str, #[case] expected: Option<u64>) {
        assert_eq!(parse_duration(text), expected);
    }

    #[test]
    fn test_quality() {
        assert_eq!(VideoQuality::from(112), VideoQuality::P1080Plus);
        assert_eq!(VideoQuality::from(112).to_string(), "1080P+");
        assert_eq!(VideoQuality::from(999), VideoQuality::Other(999));
        assert_eq!(VideoQuality::HIGHEST.qn(), 127);
        assert!(VideoQuality::FourK.needs_fourk());
        assert!(!VideoQuality::P1080F60.needs_fourk());
    }

    proptest! {
        #[test]
        fn prop_format_count_deterministic(count in any::<u64>()) {
            prop_assert_eq!(format_count(count), format_count(count));
        }

        #[test]
        fn prop_small_counts_are_literal(count in 0u64..1_000) {
            prop_assert_eq!(format_count(count), count.to_string());
        }

        #[test]
        fn prop_duration_round_trip(secs in 0u64..1_000_000) {
            prop_assert_eq!(parse_duration(&format_duration(secs)), Some(secs));
        }
    }
}
