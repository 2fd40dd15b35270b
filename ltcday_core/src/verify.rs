use std::fs::File;
use std::path::Path;

use log::debug;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::get_probe;

use crate::encoder::{EncodeError, EncodeRequest, LtcEncoder};

/// Stream parameters read back from a rendered file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioSummary {
    pub sample_rate: Option<u32>,
    pub bits_per_sample: Option<u32>,
    pub channels: Option<usize>,
    pub frames: Option<u64>,
}

/// Probe the container at `path` and describe its default track.
pub fn probe_wav(path: &Path) -> Result<AudioSummary, EncodeError> {
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|source| EncodeError::Probe {
            path: path.to_path_buf(),
            source,
        })?;

    let track = probed
        .format
        .default_track()
        .ok_or_else(|| EncodeError::Verification {
            path: path.to_path_buf(),
            reason: "no audio track".to_owned(),
        })?;
    let params = &track.codec_params;

    Ok(AudioSummary {
        sample_rate: params.sample_rate,
        bits_per_sample: params.bits_per_sample,
        channels: params.channels.map(|channels| channels.count()),
        frames: params.n_frames,
    })
}

/// Decorator that reads every rendered file back and rejects mismatches.
#[derive(Clone, Debug)]
pub struct VerifyingEncoder<E> {
    inner: E,
}

impl<E> VerifyingEncoder<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: LtcEncoder> LtcEncoder for VerifyingEncoder<E> {
    fn validate(&self, request: &EncodeRequest<'_>) -> Result<(), EncodeError> {
        self.inner.validate(request)
    }

    fn encode(&mut self, request: &EncodeRequest<'_>) -> Result<(), EncodeError> {
        self.inner.encode(request)?;

        let summary = probe_wav(request.output_path)?;
        debug!("{}: {summary:?}", request.output_path.display());

        let expected = AudioSummary {
            sample_rate: Some(request.sample_rate.hz()),
            bits_per_sample: Some(u32::from(request.bit_depth.bits())),
            channels: Some(1),
            frames: Some(request.total_samples()),
        };
        if summary != expected {
            return Err(EncodeError::Verification {
                path: request.output_path.to_path_buf(),
                reason: format!("expected {expected:?}, found {summary:?}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BitDepth, FrameRate, SampleRate};
    use crate::timecode::Timecode;
    use crate::wav::LtcWavEncoder;
    use std::fs;
    use tempfile::tempdir;

    fn request(path: &Path, bit_depth: BitDepth) -> EncodeRequest<'_> {
        EncodeRequest {
            frame_rate: FrameRate::new(25.0).unwrap(),
            start: Timecode::from_minute_of_day(600),
            duration_secs: 2,
            sample_rate: SampleRate::Hz48000,
            bit_depth,
            output_path: path,
        }
    }

    #[test]
    fn built_in_output_passes_verification() {
        let dir = tempdir().unwrap();
        for depth in [BitDepth::Eight, BitDepth::Sixteen, BitDepth::TwentyFour] {
            let path = dir.path().join(format!("tone_{depth}.wav"));
            let mut encoder = VerifyingEncoder::new(LtcWavEncoder::new());
            encoder.encode(&request(&path, depth)).unwrap();

            let summary = probe_wav(&path).unwrap();
            assert_eq!(summary.frames, Some(96_000));
            assert_eq!(summary.bits_per_sample, Some(u32::from(depth.bits())));
        }
    }

    struct Truncating;

    impl LtcEncoder for Truncating {
        fn encode(&mut self, request: &EncodeRequest<'_>) -> Result<(), EncodeError> {
            let mut short = *request;
            short.duration_secs = 1;
            LtcWavEncoder::new().encode(&short)
        }
    }

    #[test]
    fn short_output_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.wav");
        let mut encoder = VerifyingEncoder::new(Truncating);

        let err = encoder
            .encode(&request(&path, BitDepth::Sixteen))
            .unwrap_err();
        assert!(matches!(err, EncodeError::Verification { .. }));
    }

    #[test]
    fn garbage_output_fails_to_probe() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        fs::write(&path, b"not an audio file").unwrap();

        assert!(probe_wav(&path).is_err());
    }
}
