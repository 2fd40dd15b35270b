//! Batch generation of a broadcast day's worth of linear timecode audio.
//!
//! A [`BatchConfig`] describes the day; [`plan()`] cuts it into contiguous
//! [`Segment`]s and a [`BatchRun`] feeds them, in order, to an [`LtcEncoder`].

pub mod batch;
pub mod command;
pub mod config;
pub mod encoder;
pub mod ltc;
pub mod plan;
pub mod timecode;
pub mod verify;
pub mod wav;

use std::path::PathBuf;

use thiserror::Error;

pub use batch::{
    BatchRun, BatchSummary, CancellationToken, ProgressEvent, ProgressReporter, RunStatus,
    SilentProgress,
};
pub use command::CommandEncoder;
pub use config::{BatchConfig, BatchConfigBuilder, BitDepth, ConfigError, FrameRate, SampleRate};
pub use encoder::{EncodeError, EncodeRequest, LtcEncoder};
pub use plan::{plan, Segment};
pub use timecode::{Timecode, TimecodeError};
pub use verify::{probe_wav, VerifyingEncoder};
pub use wav::LtcWavEncoder;

/// Minutes in the day being segmented.
pub const DAY_MINUTES: u32 = 24 * 60;

/// Errors that end a batch, either before it starts or part way through.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The start timecode could not be parsed.
    #[error(transparent)]
    Format(#[from] TimecodeError),

    /// A configuration value or the output directory was rejected.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// The encoder refused a segment up front; nothing was encoded.
    #[error("segment {index} ({label}) cannot be encoded")]
    Unsupported {
        index: usize,
        label: String,
        #[source]
        source: EncodeError,
    },

    /// The encoder failed; later segments were not attempted.
    #[error("failed to encode segment {index} ({label})")]
    Encoding {
        index: usize,
        label: String,
        #[source]
        source: EncodeError,
    },

    /// A cancellation token stopped the run between segments.
    #[error("batch cancelled after {completed} of {total} segment(s)")]
    Cancelled { completed: usize, total: usize },

    /// The run had already been executed.
    #[error("batch run has already been executed")]
    AlreadyExecuted,
}

impl BatchError {
    /// 1-based index of the segment that failed to encode, if any.
    pub fn failed_segment(&self) -> Option<usize> {
        match self {
            BatchError::Encoding { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Output paths the configuration would produce, in encoding order.
pub fn plan_segments(config: &BatchConfig) -> Result<Vec<(Segment, PathBuf)>, BatchError> {
    let segments = plan(
        config.start().minute_of_day(),
        config.segment_minutes(),
        config.frame_rate(),
    )?;
    Ok(segments
        .into_iter()
        .map(|segment| {
            let path = segment.output_path(config.output_dir());
            (segment, path)
        })
        .collect())
}

/// Render the whole day with the built-in encoder.
pub fn run(config: BatchConfig) -> Result<BatchSummary, BatchError> {
    run_with_progress(config, &mut LtcWavEncoder::new(), &mut SilentProgress)
}

/// Validate, plan and execute `config` through `encoder`, reporting to `reporter`.
pub fn run_with_progress<E, R>(
    config: BatchConfig,
    encoder: &mut E,
    reporter: &mut R,
) -> Result<BatchSummary, BatchError>
where
    E: LtcEncoder + ?Sized,
    R: ProgressReporter + ?Sized,
{
    BatchRun::start(config)?.execute(encoder, reporter)
}
