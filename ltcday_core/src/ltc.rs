//! SMPTE linear timecode frames and their biphase-mark audio rendering.
//!
//! Frames are packed LSB first: bit `n` of the 80-bit word lives in
//! `bytes[n / 8]` at position `n % 8`, which is also transmission order.

use crate::config::FrameRate;
use crate::timecode::Timecode;

pub const FRAME_BITS: usize = 80;

/// Highest nominal rate the two-bit frame-tens field can label.
pub const MAX_FRAME_RATE: u32 = 30;

/// Bits 64..80, transmitted as `0011 1111 1111 1101`.
const SYNC_WORD: [u8; 2] = [0xFC, 0xBF];

/// Half-bit periods per frame; every bit cell has a mid-point.
const HALF_BITS_PER_FRAME: u64 = FRAME_BITS as u64 * 2;

/// One 80-bit LTC codeword.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LtcFrame {
    bytes: [u8; FRAME_BITS / 8],
}

impl LtcFrame {
    /// Pack `timecode` as a non-drop frame with empty user bits.
    ///
    /// Frame numbers of 40 and above do not fit the frame-tens field; callers
    /// keep `frame_rate` at or below [`MAX_FRAME_RATE`].
    pub fn new(timecode: Timecode, frame_rate: FrameRate) -> Self {
        let mut frame = Self {
            bytes: [0; FRAME_BITS / 8],
        };
        let frames = timecode.frames();
        let seconds = u32::from(timecode.seconds());
        let minutes = u32::from(timecode.minutes());
        let hours = u32::from(timecode.hours());

        frame.set_field(0, 4, frames % 10);
        frame.set_field(8, 2, frames / 10 % 10);
        frame.set_field(16, 4, seconds % 10);
        frame.set_field(24, 3, seconds / 10);
        frame.set_field(32, 4, minutes % 10);
        frame.set_field(40, 3, minutes / 10);
        frame.set_field(48, 4, hours % 10);
        frame.set_field(56, 2, hours / 10);
        frame.bytes[8] = SYNC_WORD[0];
        frame.bytes[9] = SYNC_WORD[1];

        if frame.count_ones() % 2 == 1 {
            frame.set_field(polarity_bit(frame_rate), 1, 1);
        }
        frame
    }

    pub fn bit(&self, index: usize) -> bool {
        self.bytes[index / 8] >> (index % 8) & 1 == 1
    }

    fn count_ones(&self) -> u32 {
        self.bytes.iter().map(|b| b.count_ones()).sum()
    }

    fn set_field(&mut self, offset: usize, width: usize, value: u32) {
        for bit in 0..width {
            let index = offset + bit;
            if value >> bit & 1 == 1 {
                self.bytes[index / 8] |= 1 << (index % 8);
            } else {
                self.bytes[index / 8] &= !(1 << (index % 8));
            }
        }
    }
}

/// Whether frames at `frame_rate` can be packed without losing digits.
pub fn supports(frame_rate: FrameRate) -> bool {
    frame_rate.nominal() <= MAX_FRAME_RATE
}

/// 625/50 systems move the polarity correction bit to 59.
fn polarity_bit(frame_rate: FrameRate) -> usize {
    if frame_rate.nominal() == 25 {
        59
    } else {
        27
    }
}

/// Convert a level in dBFS to a linear peak amplitude.
pub fn amplitude_from_dbfs(dbfs: f64) -> f32 {
    10f64.powf(dbfs / 20.0) as f32
}

/// Render `total_samples` of biphase-mark LTC starting at `start`.
///
/// Bit timing follows the real frame rate, so 29.97 produces 29.97 frames per
/// second while the labels count 30 per second. `sink` receives one sample per
/// call in the range `-amplitude..=amplitude`.
pub fn render<F, E>(
    start: Timecode,
    frame_rate: FrameRate,
    sample_rate: u32,
    total_samples: u64,
    amplitude: f32,
    mut sink: F,
) -> Result<(), E>
where
    F: FnMut(f32) -> Result<(), E>,
{
    let samples_per_half_bit =
        f64::from(sample_rate) / (frame_rate.as_f64() * HALF_BITS_PER_FRAME as f64);

    let mut timecode = start;
    let mut frame = LtcFrame::new(timecode, frame_rate);
    let mut half_bit: u64 = 0;
    let mut high = false;
    let mut written: u64 = 0;

    while written < total_samples {
        let position = half_bit % HALF_BITS_PER_FRAME;
        if position == 0 && half_bit > 0 {
            timecode = timecode.next_frame(frame_rate);
            frame = LtcFrame::new(timecode, frame_rate);
        }
        if position % 2 == 0 || frame.bit(position as usize / 2) {
            high = !high;
        }

        half_bit += 1;
        let end = ((half_bit as f64 * samples_per_half_bit).round() as u64).min(total_samples);
        let level = if high { amplitude } else { -amplitude };
        while written < end {
            sink(level)?;
            written += 1;
        }
    }

    Ok(())
}
