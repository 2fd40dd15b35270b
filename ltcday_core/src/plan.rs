use std::path::{Path, PathBuf};

use crate::config::{ConfigError, FrameRate};
use crate::timecode::Timecode;
use crate::DAY_MINUTES;

/// Extension of every segment file.
pub const SEGMENT_EXTENSION: &str = "wav";

/// One window of the day rendered to one output file.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// Position in the plan, starting at 1.
    pub index: usize,
    pub frame_rate: FrameRate,
    pub start: Timecode,
    pub duration_secs: u32,
    pub file_name: String,
}

impl Segment {
    pub fn start_minute(&self) -> u32 {
        self.start.minute_of_day()
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_secs / 60
    }

    /// Minute of day just past the end of this segment.
    pub fn end_minute(&self) -> u32 {
        self.start_minute() + self.duration_minutes()
    }

    /// Start timecode with the frame field padded for the segment's rate, as
    /// shown in progress reports, errors and encoder arguments.
    pub fn label(&self) -> String {
        self.start.display_for(self.frame_rate)
    }

    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.file_name)
    }
}

/// Deterministic name for the segment starting at `start`.
pub fn segment_file_name(frame_rate: FrameRate, start: Timecode) -> String {
    format!(
        "ltc_fps{}_{:02}h_{:02}m.{SEGMENT_EXTENSION}",
        frame_rate,
        start.hours(),
        start.minutes()
    )
}

/// Split `[day_start_minute, 1440)` into consecutive windows of
/// `offset_minutes`, truncating the last window at midnight.
pub fn plan(
    day_start_minute: u32,
    offset_minutes: u32,
    frame_rate: FrameRate,
) -> Result<Vec<Segment>, ConfigError> {
    if offset_minutes == 0 || offset_minutes > DAY_MINUTES {
        return Err(ConfigError::InvalidSegmentLength(offset_minutes));
    }
    if day_start_minute >= DAY_MINUTES {
        return Err(ConfigError::InvalidDayStart(day_start_minute));
    }

    let remaining = DAY_MINUTES - day_start_minute;
    let mut segments = Vec::with_capacity(remaining.div_ceil(offset_minutes) as usize);
    let mut cursor = day_start_minute;
    while cursor < DAY_MINUTES {
        let minutes = offset_minutes.min(DAY_MINUTES - cursor);
        let start = Timecode::from_minute_of_day(cursor);
        segments.push(Segment {
            index: segments.len() + 1,
            frame_rate,
            start,
            duration_secs: minutes * 60,
            file_name: segment_file_name(frame_rate, start),
        });
        cursor += offset_minutes;
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn fps(value: f64) -> FrameRate {
        FrameRate::new(value).unwrap()
    }

    #[test]
    fn ten_minute_segments_cover_the_day() {
        let segments = plan(0, 10, fps(29.97)).unwrap();
        assert_eq!(segments.len(), 144);

        assert_eq!(segments[0].label(), "00:00:00:00");
        assert_eq!(segments[0].duration_secs, 600);
        assert_eq!(segments[1].label(), "00:10:00:00");
        assert_eq!(segments[1].duration_secs, 600);
        let last = segments.last().unwrap();
        assert_eq!(last.index, 144);
        assert_eq!(last.label(), "23:50:00:00");
        assert_eq!(last.duration_secs, 600);
    }

    #[test]
    fn uneven_offset_truncates_final_segment() {
        let segments = plan(0, 700, fps(25.0)).unwrap();
        let windows: Vec<_> = segments
            .iter()
            .map(|s| (s.label(), s.duration_secs))
            .collect();
        assert_eq!(
            windows,
            [
                ("00:00:00:00".to_owned(), 42_000),
                ("11:40:00:00".to_owned(), 42_000),
                ("23:20:00:00".to_owned(), 2_400),
            ]
        );
    }

    #[test]
    fn every_offset_tiles_the_remaining_day() {
        let rate = fps(30.0);
        for start in [0, 1, 599, 1439] {
            for offset in 1..=DAY_MINUTES {
                let segments = plan(start, offset, rate).unwrap();
                assert_eq!(segments[0].start_minute(), start);
                for pair in segments.windows(2) {
                    assert_eq!(pair[1].start_minute(), pair[0].end_minute());
                    assert_eq!(pair[0].duration_minutes(), offset);
                }
                assert_eq!(segments.last().unwrap().end_minute(), DAY_MINUTES);
            }
        }
    }

    #[test]
    fn file_names_are_unique_and_encode_rate_and_start() {
        let segments = plan(0, 1, fps(29.97)).unwrap();
        let names: HashSet<_> = segments.iter().map(|s| s.file_name.as_str()).collect();
        assert_eq!(names.len(), segments.len());
        assert_eq!(segments[61].file_name, "ltc_fps29.97_01h_01m.wav");
    }

    #[test]
    fn plan_is_deterministic() {
        let rate = fps(24.0);
        assert_eq!(plan(30, 45, rate).unwrap(), plan(30, 45, rate).unwrap());
    }

    #[test]
    fn start_within_day_is_honoured() {
        let segments = plan(23 * 60 + 58, 1, fps(25.0)).unwrap();
        let labels: Vec<_> = segments.iter().map(Segment::label).collect();
        assert_eq!(labels, ["23:58:00:00", "23:59:00:00"]);
    }

    #[test]
    fn labels_pad_frames_for_high_rates() {
        let segments = plan(23 * 60 + 59, 1, fps(120.0)).unwrap();
        assert_eq!(segments[0].label(), "23:59:00:000");
        assert_eq!(
            segments[0].label(),
            segments[0].start.display_for(segments[0].frame_rate)
        );
    }

    #[test]
    fn rejects_out_of_range_arguments() {
        let rate = fps(25.0);
        assert!(matches!(
            plan(0, 0, rate),
            Err(ConfigError::InvalidSegmentLength(0))
        ));
        assert!(matches!(
            plan(0, DAY_MINUTES + 1, rate),
            Err(ConfigError::InvalidSegmentLength(_))
        ));
        assert!(matches!(
            plan(DAY_MINUTES, 10, rate),
            Err(ConfigError::InvalidDayStart(1440))
        ));
    }
}
