use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::timecode::Timecode;
use crate::{BatchError, DAY_MINUTES};

/// Errors raised while validating a batch configuration.
///
/// All of these are detected before the first segment is encoded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Frame rate is not finite or rounds below one frame per second.
    #[error("frame rate must be a positive number of at least one frame per second, got {0}")]
    InvalidFrameRate(f64),

    /// Segment length is outside `1..=1440` minutes.
    #[error("segment length must be between 1 and 1440 minutes, got {0}")]
    InvalidSegmentLength(u32),

    /// Day start is not a minute of the day.
    #[error("day start must be before minute 1440, got {0}")]
    InvalidDayStart(u32),

    /// Sample rate is neither 44100 nor 48000 Hz.
    #[error("sample rate must be either 44100 or 48000, got {0}")]
    UnsupportedSampleRate(u32),

    /// Bit depth is not 8, 16 or 24.
    #[error("bit depth must be either 8, 16, or 24, got {0}")]
    UnsupportedBitDepth(u16),

    /// Output level is above full scale or not finite.
    #[error("volume must not exceed 0 dBFS, got {0}")]
    InvalidVolume(f64),

    /// The output directory is missing.
    #[error("output directory does not exist: {0}")]
    MissingOutputDirectory(PathBuf),

    /// The output path names something other than a directory.
    #[error("output path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A scratch file could not be created in the output directory.
    #[error("output directory is not writable: {path}")]
    UnwritableOutputDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A planned segment file exists and overwrite is off.
    #[error("output file already exists: {0}")]
    OutputExists(PathBuf),
}

/// Video frame rate driving both timecode labels and signal timing.
///
/// Fractional rates such as 29.97 are kept as-is for timing; frame labels use
/// the nominal rate, i.e. the value rounded to the nearest integer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameRate(f64);

impl FrameRate {
    pub fn new(fps: f64) -> Result<Self, ConfigError> {
        if !fps.is_finite() || fps <= 0.0 || fps.round() < 1.0 {
            return Err(ConfigError::InvalidFrameRate(fps));
        }
        Ok(Self(fps))
    }

    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// Number of frame labels per second.
    pub fn nominal(self) -> u32 {
        self.0.round() as u32
    }

    /// Digits needed to print the largest frame number, never less than two.
    pub fn frame_digits(self) -> usize {
        let mut largest = self.nominal().saturating_sub(1);
        let mut digits = 1;
        while largest >= 10 {
            largest /= 10;
            digits += 1;
        }
        digits.max(2)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output sample rates accepted by the encoders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleRate {
    Hz44100,
    Hz48000,
}

impl SampleRate {
    pub fn hz(self) -> u32 {
        match self {
            SampleRate::Hz44100 => 44_100,
            SampleRate::Hz48000 => 48_000,
        }
    }
}

impl TryFrom<u32> for SampleRate {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            44_100 => Ok(SampleRate::Hz44100),
            48_000 => Ok(SampleRate::Hz48000),
            other => Err(ConfigError::UnsupportedSampleRate(other)),
        }
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hz())
    }
}

/// PCM sample widths accepted by the encoders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BitDepth {
    Eight,
    Sixteen,
    TwentyFour,
}

impl BitDepth {
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
            BitDepth::TwentyFour => 24,
        }
    }

    pub fn bytes_per_sample(self) -> u16 {
        self.bits() / 8
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = ConfigError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            24 => Ok(BitDepth::TwentyFour),
            other => Err(ConfigError::UnsupportedBitDepth(other)),
        }
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

pub const DEFAULT_START: &str = "00:00:00:00";
pub const DEFAULT_FRAME_RATE: f64 = 29.97;
pub const DEFAULT_SEGMENT_MINUTES: u32 = 10;
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub const DEFAULT_BIT_DEPTH: u16 = 16;

/// Validated input for one batch run.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    frame_rate: FrameRate,
    start: Timecode,
    segment_minutes: u32,
    sample_rate: SampleRate,
    bit_depth: BitDepth,
    output_dir: PathBuf,
    overwrite: bool,
}

impl BatchConfig {
    /// Start building a configuration that writes into `output_dir`.
    pub fn builder<P: AsRef<Path>>(output_dir: P) -> BatchConfigBuilder {
        BatchConfigBuilder::new(output_dir.as_ref().to_path_buf())
    }

    pub fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }

    pub fn start(&self) -> Timecode {
        self.start
    }

    pub fn segment_minutes(&self) -> u32 {
        self.segment_minutes
    }

    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Check that the output directory exists and accepts new files.
    ///
    /// The check creates and immediately removes a scratch file.
    pub fn validate_output_dir(&self) -> Result<(), ConfigError> {
        let metadata = match fs::metadata(&self.output_dir) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::MissingOutputDirectory(self.output_dir.clone()));
            }
            Err(source) => {
                return Err(ConfigError::UnwritableOutputDirectory {
                    path: self.output_dir.clone(),
                    source,
                });
            }
        };
        if !metadata.is_dir() {
            return Err(ConfigError::NotADirectory(self.output_dir.clone()));
        }

        tempfile::Builder::new()
            .prefix(".ltcday-probe")
            .tempfile_in(&self.output_dir)
            .map(drop)
            .map_err(|source| ConfigError::UnwritableOutputDirectory {
                path: self.output_dir.clone(),
                source,
            })
    }
}

/// Builder for [`BatchConfig`].
#[derive(Clone, Debug)]
pub struct BatchConfigBuilder {
    output_dir: PathBuf,
    frame_rate: f64,
    start: String,
    segment_minutes: u32,
    sample_rate: u32,
    bit_depth: u16,
    overwrite: bool,
}

impl BatchConfigBuilder {
    fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            frame_rate: DEFAULT_FRAME_RATE,
            start: DEFAULT_START.to_owned(),
            segment_minutes: DEFAULT_SEGMENT_MINUTES,
            sample_rate: DEFAULT_SAMPLE_RATE,
            bit_depth: DEFAULT_BIT_DEPTH,
            overwrite: false,
        }
    }

    pub fn frame_rate(mut self, fps: f64) -> Self {
        self.frame_rate = fps;
        self
    }

    pub fn start<S: Into<String>>(mut self, timecode: S) -> Self {
        self.start = timecode.into();
        self
    }

    pub fn segment_minutes(mut self, minutes: u32) -> Self {
        self.segment_minutes = minutes;
        self
    }

    pub fn sample_rate(mut self, hz: u32) -> Self {
        self.sample_rate = hz;
        self
    }

    pub fn bit_depth(mut self, bits: u16) -> Self {
        self.bit_depth = bits;
        self
    }

    /// Allow replacing segment files that already exist in the output directory.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Validate every value and produce the [`BatchConfig`].
    ///
    /// The output directory is canonicalized when it exists; its presence and
    /// writability are checked again when a run starts.
    pub fn build(self) -> Result<BatchConfig, BatchError> {
        let frame_rate = FrameRate::new(self.frame_rate)?;
        let start = Timecode::parse(&self.start, frame_rate)?;
        if self.segment_minutes == 0 || self.segment_minutes > DAY_MINUTES {
            return Err(ConfigError::InvalidSegmentLength(self.segment_minutes).into());
        }
        let sample_rate = SampleRate::try_from(self.sample_rate)?;
        let bit_depth = BitDepth::try_from(self.bit_depth)?;
        let output_dir = fs::canonicalize(&self.output_dir).unwrap_or(self.output_dir);

        Ok(BatchConfig {
            frame_rate,
            start,
            segment_minutes: self.segment_minutes,
            sample_rate,
            bit_depth,
            output_dir,
            overwrite: self.overwrite,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rate_rejects_non_positive_values() {
        assert!(FrameRate::new(0.0).is_err());
        assert!(FrameRate::new(-25.0).is_err());
        assert!(FrameRate::new(f64::NAN).is_err());
        assert!(FrameRate::new(0.3).is_err());
    }

    #[test]
    fn frame_rate_rounds_to_nominal_labels() {
        let rate = FrameRate::new(29.97).unwrap();
        assert_eq!(rate.nominal(), 30);
        assert_eq!(rate.frame_digits(), 2);
        assert_eq!(FrameRate::new(120.0).unwrap().frame_digits(), 3);
        assert_eq!(FrameRate::new(5.0).unwrap().frame_digits(), 2);
    }

    #[test]
    fn frame_rate_display_keeps_operator_notation() {
        assert_eq!(FrameRate::new(29.97).unwrap().to_string(), "29.97");
        assert_eq!(FrameRate::new(25.0).unwrap().to_string(), "25");
    }

    #[test]
    fn sample_rate_and_bit_depth_accept_only_enumerated_values() {
        assert_eq!(SampleRate::try_from(48_000).unwrap(), SampleRate::Hz48000);
        assert!(matches!(
            SampleRate::try_from(96_000),
            Err(ConfigError::UnsupportedSampleRate(96_000))
        ));
        assert_eq!(BitDepth::try_from(24).unwrap().bytes_per_sample(), 3);
        assert!(matches!(
            BitDepth::try_from(32),
            Err(ConfigError::UnsupportedBitDepth(32))
        ));
    }

    #[test]
    fn builder_applies_operator_defaults() {
        let config = BatchConfig::builder(".").build().unwrap();
        assert_eq!(config.frame_rate().as_f64(), DEFAULT_FRAME_RATE);
        assert_eq!(config.start().minute_of_day(), 0);
        assert_eq!(config.segment_minutes(), 10);
        assert_eq!(config.sample_rate(), SampleRate::Hz44100);
        assert_eq!(config.bit_depth(), BitDepth::Sixteen);
        assert!(!config.overwrite());
    }

    #[test]
    fn builder_rejects_out_of_range_segment_length() {
        for minutes in [0, DAY_MINUTES + 1] {
            let err = BatchConfig::builder(".")
                .segment_minutes(minutes)
                .build()
                .unwrap_err();
            assert!(matches!(
                err,
                BatchError::Configuration(ConfigError::InvalidSegmentLength(m)) if m == minutes
            ));
        }
    }

    #[test]
    fn builder_reports_malformed_start_as_format_error() {
        let err = BatchConfig::builder(".").start("12:00").build().unwrap_err();
        assert!(matches!(err, BatchError::Format(_)));
    }
}
