use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;

use crate::config::{BitDepth, FrameRate, SampleRate};
use crate::timecode::Timecode;

/// Failure reported by an [`LtcEncoder`] for a single segment.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Reading or writing the segment file failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The segment needs a data chunk larger than a RIFF file can address.
    #[error("{bytes} bytes of audio do not fit in a WAV data chunk")]
    TooLarge { bytes: u64 },

    /// The frame rate cannot be carried by the 80-bit LTC word.
    #[error("LTC cannot carry {frame_rate} fps; the nominal rate must be at most {max}")]
    UnsupportedFrameRate { frame_rate: FrameRate, max: u32 },

    /// The external encoder could not be started.
    #[error("failed to launch encoder '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The external encoder exited unsuccessfully.
    #[error("encoder '{program}' exited with {status}: {stderr}")]
    ProcessFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The external encoder exited cleanly without producing its file.
    #[error("encoder reported success but did not create {0}")]
    MissingOutput(PathBuf),

    /// The rendered file could not be opened as audio.
    #[error("failed to read back {path}")]
    Probe {
        path: PathBuf,
        #[source]
        source: symphonia::core::errors::Error,
    },

    /// The rendered file decodes but differs from what was requested.
    #[error("{path} does not match the request: {reason}")]
    Verification { path: PathBuf, reason: String },
}

/// Everything an encoder needs to render one segment.
#[derive(Clone, Copy, Debug)]
pub struct EncodeRequest<'a> {
    pub frame_rate: FrameRate,
    pub start: Timecode,
    pub duration_secs: u32,
    pub sample_rate: SampleRate,
    pub bit_depth: BitDepth,
    pub output_path: &'a Path,
}

impl EncodeRequest<'_> {
    /// Number of audio samples covering the requested duration.
    pub fn total_samples(&self) -> u64 {
        u64::from(self.duration_secs) * u64::from(self.sample_rate.hz())
    }
}

/// Renders LTC audio for one segment.
///
/// A call blocks until the file at `output_path` is completely written or an
/// error is returned. After an error no usable file is guaranteed to exist.
pub trait LtcEncoder {
    /// Reject requests this encoder can never satisfy, without touching disk.
    ///
    /// Runs for every segment before the first one is encoded.
    fn validate(&self, _request: &EncodeRequest<'_>) -> Result<(), EncodeError> {
        Ok(())
    }

    fn encode(&mut self, request: &EncodeRequest<'_>) -> Result<(), EncodeError>;
}

impl<E: LtcEncoder + ?Sized> LtcEncoder for &mut E {
    fn validate(&self, request: &EncodeRequest<'_>) -> Result<(), EncodeError> {
        (**self).validate(request)
    }

    fn encode(&mut self, request: &EncodeRequest<'_>) -> Result<(), EncodeError> {
        (**self).encode(request)
    }
}

impl<E: LtcEncoder + ?Sized> LtcEncoder for Box<E> {
    fn validate(&self, request: &EncodeRequest<'_>) -> Result<(), EncodeError> {
        (**self).validate(request)
    }

    fn encode(&mut self, request: &EncodeRequest<'_>) -> Result<(), EncodeError> {
        (**self).encode(request)
    }
}
