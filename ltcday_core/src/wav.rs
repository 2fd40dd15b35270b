use std::io::{self, BufWriter, Write};

use log::debug;

use crate::config::{BitDepth, ConfigError};
use crate::encoder::{EncodeError, EncodeRequest, LtcEncoder};
use crate::ltc;

const HEADER_LEN: u32 = 44;

/// Size of the data chunk for `total_samples`, if a RIFF file can hold it.
pub fn data_chunk_len(total_samples: u64, bit_depth: BitDepth) -> Result<u32, EncodeError> {
    let bytes = total_samples * u64::from(bit_depth.bytes_per_sample());
    u32::try_from(bytes)
        .ok()
        .filter(|len| len.checked_add(HEADER_LEN - 8).is_some())
        .ok_or(EncodeError::TooLarge { bytes })
}

/// Default signal level, matching common LTC generator output.
pub const DEFAULT_VOLUME_DBFS: f64 = -3.0;

/// Streaming writer for single-channel PCM WAV data.
///
/// The sample count must be known up front so the RIFF sizes can be written
/// before the samples.
pub struct WavWriter<W: Write> {
    inner: W,
    bit_depth: BitDepth,
    remaining: u64,
}

impl<W: Write> WavWriter<W> {
    pub fn new(
        mut inner: W,
        sample_rate: u32,
        bit_depth: BitDepth,
        total_samples: u64,
    ) -> Result<Self, EncodeError> {
        let block_align = bit_depth.bytes_per_sample();
        let data_len = data_chunk_len(total_samples, bit_depth)?;

        inner.write_all(b"RIFF")?;
        inner.write_all(&(HEADER_LEN - 8 + data_len).to_le_bytes())?;
        inner.write_all(b"WAVE")?;
        inner.write_all(b"fmt ")?;
        inner.write_all(&16u32.to_le_bytes())?; // PCM header size
        inner.write_all(&1u16.to_le_bytes())?; // audio format = PCM
        inner.write_all(&1u16.to_le_bytes())?; // channels
        inner.write_all(&sample_rate.to_le_bytes())?;
        inner.write_all(&(sample_rate * u32::from(block_align)).to_le_bytes())?;
        inner.write_all(&block_align.to_le_bytes())?;
        inner.write_all(&bit_depth.bits().to_le_bytes())?;
        inner.write_all(b"data")?;
        inner.write_all(&data_len.to_le_bytes())?;

        Ok(Self {
            inner,
            bit_depth,
            remaining: total_samples,
        })
    }

    /// Write one sample in `-1.0..=1.0`.
    pub fn write_sample(&mut self, sample: f32) -> io::Result<()> {
        if self.remaining == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "more samples than declared in the WAV header",
            ));
        }
        self.remaining -= 1;

        let sample = sample.clamp(-1.0, 1.0);
        match self.bit_depth {
            BitDepth::Eight => {
                let value = (sample * 127.0).round() as i16 + 128;
                self.inner.write_all(&[value as u8])
            }
            BitDepth::Sixteen => {
                let value = (sample * f32::from(i16::MAX)).round() as i16;
                self.inner.write_all(&value.to_le_bytes())
            }
            BitDepth::TwentyFour => {
                let value = (sample * 8_388_607.0).round() as i32;
                self.inner.write_all(&value.to_le_bytes()[..3])
            }
        }
    }

    /// Flush and return the inner writer once every declared sample is written.
    pub fn finish(mut self) -> io::Result<W> {
        if self.remaining != 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} declared samples were never written", self.remaining),
            ));
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Built-in encoder that renders LTC straight into a WAV file.
///
/// Audio is written to a temporary file next to the target and renamed into
/// place, so the target path is either complete or untouched.
#[derive(Clone, Debug)]
pub struct LtcWavEncoder {
    amplitude: f32,
}

impl LtcWavEncoder {
    pub fn new() -> Self {
        Self {
            amplitude: ltc::amplitude_from_dbfs(DEFAULT_VOLUME_DBFS),
        }
    }

    /// Set the peak level in dBFS; 0 dBFS is full scale.
    pub fn with_volume(mut self, dbfs: f64) -> Result<Self, ConfigError> {
        if !dbfs.is_finite() || dbfs > 0.0 {
            return Err(ConfigError::InvalidVolume(dbfs));
        }
        self.amplitude = ltc::amplitude_from_dbfs(dbfs);
        Ok(self)
    }
}

impl Default for LtcWavEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LtcEncoder for LtcWavEncoder {
    fn validate(&self, request: &EncodeRequest<'_>) -> Result<(), EncodeError> {
        if !ltc::supports(request.frame_rate) {
            return Err(EncodeError::UnsupportedFrameRate {
                frame_rate: request.frame_rate,
                max: ltc::MAX_FRAME_RATE,
            });
        }
        data_chunk_len(request.total_samples(), request.bit_depth).map(drop)
    }

    fn encode(&mut self, request: &EncodeRequest<'_>) -> Result<(), EncodeError> {
        self.validate(request)?;

        let directory = request
            .output_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        let total_samples = request.total_samples();
        debug!(
            "rendering {} samples of {} fps LTC from {} into {}",
            total_samples,
            request.frame_rate,
            request.start,
            request.output_path.display()
        );

        let staging = tempfile::Builder::new()
            .prefix(".ltcday-")
            .suffix(".partial")
            .tempfile_in(directory)?;
        let mut writer = WavWriter::new(
            BufWriter::new(staging),
            request.sample_rate.hz(),
            request.bit_depth,
            total_samples,
        )?;
        ltc::render(
            request.start,
            request.frame_rate,
            request.sample_rate.hz(),
            total_samples,
            self.amplitude,
            |sample| writer.write_sample(sample),
        )?;

        let staging = writer
            .finish()?
            .into_inner()
            .map_err(io::IntoInnerError::into_error)?;
        staging
            .persist(request.output_path)
            .map_err(|err| EncodeError::Io(err.error))?;
        Ok(())
    }
}
