use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::{BatchConfig, ConfigError};
use crate::encoder::{EncodeRequest, LtcEncoder};
use crate::plan::{plan, Segment};
use crate::BatchError;

/// Observation emitted while a run progresses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent<'a> {
    /// The run is about to encode `total` segments.
    Start { total: usize },
    /// Segment `label` was written; `completed` of `total` are done.
    Segment {
        completed: usize,
        total: usize,
        label: &'a str,
    },
    /// Every segment was written.
    Finish,
}

/// Receives [`ProgressEvent`]s from a running batch.
pub trait ProgressReporter {
    fn on_event(&mut self, _event: &ProgressEvent<'_>) {}
}

impl<F> ProgressReporter for F
where
    F: FnMut(&ProgressEvent<'_>),
{
    fn on_event(&mut self, event: &ProgressEvent<'_>) {
        self(event)
    }
}

/// Reporter that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {}

/// Shared flag asking a run to stop before its next segment.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Lifecycle of a [`BatchRun`]. `Succeeded`, `Failed` and `Cancelled` are final.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Pending,
    Running,
    Succeeded,
    Failed { index: usize },
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Pending | RunStatus::Running)
    }
}

/// What a successful run produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchSummary {
    pub segments_written: usize,
    pub files: Vec<PathBuf>,
}

/// Handle over one execution of a validated [`BatchConfig`].
#[derive(Debug)]
pub struct BatchRun {
    config: BatchConfig,
    segments: Vec<Segment>,
    completed: usize,
    current: Option<usize>,
    status: RunStatus,
    cancel: Option<CancellationToken>,
}

impl BatchRun {
    /// Validate `config` against the file system and plan the day.
    ///
    /// Nothing is written when this fails.
    pub fn start(config: BatchConfig) -> Result<Self, BatchError> {
        config.validate_output_dir()?;

        let start = config.start();
        if start.seconds() != 0 || start.frames() != 0 {
            warn!(
                "start timecode {} is aligned down to {:02}:{:02}:00:00",
                start,
                start.hours(),
                start.minutes()
            );
        }

        let segments = plan(
            start.minute_of_day(),
            config.segment_minutes(),
            config.frame_rate(),
        )?;

        if !config.overwrite() {
            if let Some(existing) = segments
                .iter()
                .map(|segment| segment.output_path(config.output_dir()))
                .find(|path| path.exists())
            {
                return Err(ConfigError::OutputExists(existing).into());
            }
        }

        debug!(
            "planned {} segment(s) of {} minute(s) from {} into {}",
            segments.len(),
            config.segment_minutes(),
            start,
            config.output_dir().display()
        );

        Ok(Self {
            config,
            segments,
            completed: 0,
            current: None,
            status: RunStatus::Pending,
            cancel: None,
        })
    }

    /// Check `token` before each segment and stop once it is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn total(&self) -> usize {
        self.segments.len()
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// 1-based index of the segment being encoded or last attempted.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Encode every planned segment in order, stopping at the first failure.
    ///
    /// Every segment is checked with [`LtcEncoder::validate`] first; a
    /// rejection leaves the run `Pending` with nothing written. Files written
    /// before an encoding failure are left in place. A run executes at most
    /// once.
    pub fn execute<E, R>(
        &mut self,
        encoder: &mut E,
        reporter: &mut R,
    ) -> Result<BatchSummary, BatchError>
    where
        E: LtcEncoder + ?Sized,
        R: ProgressReporter + ?Sized,
    {
        if self.status != RunStatus::Pending {
            return Err(BatchError::AlreadyExecuted);
        }
        for segment in &self.segments {
            let output_path = segment.output_path(self.config.output_dir());
            let request = encode_request(&self.config, segment, &output_path);
            if let Err(source) = encoder.validate(&request) {
                return Err(BatchError::Unsupported {
                    index: segment.index,
                    label: segment.label(),
                    source,
                });
            }
        }
        self.status = RunStatus::Running;

        let total = self.segments.len();
        reporter.on_event(&ProgressEvent::Start { total });

        let mut files = Vec::with_capacity(total);
        for segment in &self.segments {
            if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                warn!(
                    "batch cancelled after {} of {} segment(s)",
                    self.completed, total
                );
                self.status = RunStatus::Cancelled;
                return Err(BatchError::Cancelled {
                    completed: self.completed,
                    total,
                });
            }

            self.current = Some(segment.index);
            let label = segment.label();
            let output_path = segment.output_path(self.config.output_dir());
            info!(
                "encoding segment {}/{} at {} ({} s) to {}",
                segment.index,
                total,
                label,
                segment.duration_secs,
                output_path.display()
            );

            let request = encode_request(&self.config, segment, &output_path);
            if let Err(source) = encoder.encode(&request) {
                warn!(
                    "segment {}/{} at {} failed; {} segment(s) left unattempted",
                    segment.index,
                    total,
                    label,
                    total - segment.index
                );
                self.status = RunStatus::Failed {
                    index: segment.index,
                };
                return Err(BatchError::Encoding {
                    index: segment.index,
                    label,
                    source,
                });
            }

            self.completed += 1;
            files.push(output_path);
            reporter.on_event(&ProgressEvent::Segment {
                completed: self.completed,
                total,
                label: &label,
            });
        }

        self.status = RunStatus::Succeeded;
        reporter.on_event(&ProgressEvent::Finish);
        info!("wrote {} segment(s)", self.completed);

        Ok(BatchSummary {
            segments_written: self.completed,
            files,
        })
    }
}

fn encode_request<'p>(
    config: &BatchConfig,
    segment: &Segment,
    output_path: &'p Path,
) -> EncodeRequest<'p> {
    EncodeRequest {
        frame_rate: segment.frame_rate,
        start: segment.start,
        duration_secs: segment.duration_secs,
        sample_rate: config.sample_rate(),
        bit_depth: config.bit_depth(),
        output_path,
    }
}
