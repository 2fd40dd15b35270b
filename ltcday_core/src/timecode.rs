use std::fmt;

use thiserror::Error;

use crate::config::FrameRate;
use crate::DAY_MINUTES;

/// Errors produced while parsing `HH:MM:SS:FF` text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimecodeError {
    /// The text does not split into exactly four fields.
    #[error("timecode '{input}' must have four colon-separated fields (HH:MM:SS:FF), found {found}")]
    FieldCount { input: String, found: usize },

    /// A field is empty or contains something other than digits.
    #[error("timecode '{input}': {field} field '{value}' is not a number")]
    NotNumeric {
        input: String,
        field: &'static str,
        value: String,
    },

    /// A field is at or above its limit.
    #[error("timecode '{input}': {field} value {value} is out of range (must be below {limit})")]
    OutOfRange {
        input: String,
        field: &'static str,
        value: u32,
        limit: u32,
    },
}

/// A non-drop instant within a single day at frame resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timecode {
    hours: u8,
    minutes: u8,
    seconds: u8,
    frames: u32,
}

const FIELDS: [&str; 4] = ["hour", "minute", "second", "frame"];

impl Timecode {
    /// Midnight, `00:00:00:00`.
    pub const MIDNIGHT: Timecode = Timecode {
        hours: 0,
        minutes: 0,
        seconds: 0,
        frames: 0,
    };

    /// Parse `HH:MM:SS:FF`, checking the frame field against the nominal rate.
    pub fn parse(text: &str, frame_rate: FrameRate) -> Result<Self, TimecodeError> {
        let input = text.trim();
        let parts: Vec<&str> = input.split(':').collect();
        if parts.len() != FIELDS.len() {
            return Err(TimecodeError::FieldCount {
                input: input.to_owned(),
                found: parts.len(),
            });
        }

        let limits = [24, 60, 60, frame_rate.nominal()];
        let mut values = [0u32; 4];
        for (index, part) in parts.iter().enumerate() {
            let field = FIELDS[index];
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(TimecodeError::NotNumeric {
                    input: input.to_owned(),
                    field,
                    value: (*part).to_owned(),
                });
            }
            let value = part.parse::<u32>().map_err(|_| TimecodeError::OutOfRange {
                input: input.to_owned(),
                field,
                value: u32::MAX,
                limit: limits[index],
            })?;
            if value >= limits[index] {
                return Err(TimecodeError::OutOfRange {
                    input: input.to_owned(),
                    field,
                    value,
                    limit: limits[index],
                });
            }
            values[index] = value;
        }

        Ok(Self {
            hours: values[0] as u8,
            minutes: values[1] as u8,
            seconds: values[2] as u8,
            frames: values[3],
        })
    }

    /// Whole-minute timecode for a minute of the day; wraps at midnight.
    pub fn from_minute_of_day(minute: u32) -> Self {
        let minute = minute % DAY_MINUTES;
        Self {
            hours: (minute / 60) as u8,
            minutes: (minute % 60) as u8,
            seconds: 0,
            frames: 0,
        }
    }

    pub fn hours(&self) -> u8 {
        self.hours
    }

    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    pub fn seconds(&self) -> u8 {
        self.seconds
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// `hours * 60 + minutes`; seconds and frames are ignored.
    pub fn minute_of_day(&self) -> u32 {
        u32::from(self.hours) * 60 + u32::from(self.minutes)
    }

    /// Frames elapsed since midnight at the nominal rate.
    pub fn frame_of_day(&self, frame_rate: FrameRate) -> u64 {
        let seconds = u64::from(self.minute_of_day()) * 60 + u64::from(self.seconds);
        seconds * u64::from(frame_rate.nominal()) + u64::from(self.frames)
    }

    /// The following frame label, non-drop, rolling over to midnight after
    /// the last frame of `23:59:59`.
    pub fn next_frame(&self, frame_rate: FrameRate) -> Self {
        let mut next = *self;
        next.frames += 1;
        if next.frames < frame_rate.nominal() {
            return next;
        }
        next.frames = 0;
        next.seconds += 1;
        if next.seconds < 60 {
            return next;
        }
        next.seconds = 0;
        next.minutes += 1;
        if next.minutes < 60 {
            return next;
        }
        next.minutes = 0;
        next.hours = (next.hours + 1) % 24;
        next
    }

    /// Render with the frame field padded for `frame_rate`.
    pub fn display_for(&self, frame_rate: FrameRate) -> String {
        format!(
            "{:02}:{:02}:{:02}:{:0width$}",
            self.hours,
            self.minutes,
            self.seconds,
            self.frames,
            width = frame_rate.frame_digits()
        )
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fps(value: f64) -> FrameRate {
        FrameRate::new(value).unwrap()
    }

    #[test]
    fn parses_and_formats_canonical_text() {
        let tc = Timecode::parse("01:02:03:04", fps(25.0)).unwrap();
        assert_eq!(
            (tc.hours(), tc.minutes(), tc.seconds(), tc.frames()),
            (1, 2, 3, 4)
        );
        assert_eq!(tc.to_string(), "01:02:03:04");
        assert_eq!(tc.minute_of_day(), 62);
    }

    #[test]
    fn rejects_wrong_field_count() {
        let err = Timecode::parse("01:02:03", fps(25.0)).unwrap_err();
        assert!(matches!(err, TimecodeError::FieldCount { found: 3, .. }));
        assert!(Timecode::parse("01:02:03:04:05", fps(25.0)).is_err());
    }

    #[test]
    fn rejects_non_numeric_fields() {
        let err = Timecode::parse("aa:00:00:00", fps(25.0)).unwrap_err();
        assert!(matches!(err, TimecodeError::NotNumeric { field: "hour", .. }));
        assert!(Timecode::parse("00::00:00", fps(25.0)).is_err());
        assert!(Timecode::parse("00:-1:00:00", fps(25.0)).is_err());
    }

    #[test]
    fn rejects_out_of_range_fields() {
        for (text, field) in [
            ("24:00:00:00", "hour"),
            ("00:60:00:00", "minute"),
            ("00:00:60:00", "second"),
            ("00:00:00:25", "frame"),
        ] {
            match Timecode::parse(text, fps(25.0)) {
                Err(TimecodeError::OutOfRange { field: f, .. }) => assert_eq!(f, field),
                other => panic!("unexpected result for {text}: {other:?}"),
            }
        }
    }

    #[test]
    fn frame_limit_uses_rounded_rate() {
        assert!(Timecode::parse("00:00:00:29", fps(29.97)).is_ok());
        assert!(Timecode::parse("00:00:00:30", fps(29.97)).is_err());
        assert!(Timecode::parse("00:00:00:23", fps(23.976)).is_ok());
        assert!(Timecode::parse("00:00:00:24", fps(23.976)).is_err());
    }

    #[test]
    fn minute_of_day_round_trips_through_whole_minutes() {
        for minute in [0, 1, 59, 60, 700, 1439] {
            assert_eq!(Timecode::from_minute_of_day(minute).minute_of_day(), minute);
        }
        assert_eq!(Timecode::from_minute_of_day(700).to_string(), "11:40:00:00");
    }

    #[test]
    fn next_frame_carries_and_wraps_at_midnight() {
        let rate = fps(25.0);
        let tc = Timecode::parse("00:00:59:24", rate).unwrap();
        assert_eq!(tc.next_frame(rate).to_string(), "00:01:00:00");

        let last = Timecode::parse("23:59:59:24", rate).unwrap();
        assert_eq!(last.next_frame(rate), Timecode::MIDNIGHT);
    }

    #[test]
    fn frame_of_day_counts_nominal_frames() {
        let rate = fps(30.0);
        let tc = Timecode::parse("00:01:00:05", rate).unwrap();
        assert_eq!(tc.frame_of_day(rate), 60 * 30 + 5);
    }

    #[test]
    fn display_widens_frame_field_for_high_rates() {
        let rate = fps(120.0);
        let tc = Timecode::parse("10:00:00:7", rate).unwrap();
        assert_eq!(tc.display_for(rate), "10:00:00:007");
        assert_eq!(tc.display_for(fps(25.0)), "10:00:00:07");
    }
}
