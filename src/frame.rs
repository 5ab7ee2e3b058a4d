//! SDS011 data report frame.
//!
//! ```text
//! 0     1     2      3      4     5     6    7    8      9
//! 0xAA  0xC0  PM2.5  PM2.5  PM10  PM10  0x00 0x00 check  0xAB
//!             low    high   low   high
//! ```
//!
//! The check byte is the 8-bit wrapping sum of bytes 2..=7. Both readings are
//! little endian and scaled by 10.

use scroll::{Pread, LE};
use thiserror::Error;

/// Length of a data report frame on the wire.
pub const FRAME_SIZE: usize = 10;
/// Shortest buffer the decoder accepts. The tail marker is optional.
pub const MIN_FRAME_SIZE: usize = 9;

/// Marks the beginning of every frame.
pub const HEAD: u8 = 0xAA;
/// Identifies a data report, sent in active mode or as a query reply.
pub const DATA_REPORT_ID: u8 = 0xC0;
/// Marks the end of every frame.
pub const TAIL: u8 = 0xAB;

const DATA_START: usize = 2;
const CHECKSUM_OFFSET: usize = 8;
const TAIL_OFFSET: usize = 9;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("frame truncated: {len} bytes, need at least {MIN_FRAME_SIZE}")]
    TruncatedFrame { len: usize },

    #[error("checksum mismatch: computed 0x{expected:02X}, frame carries 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("unexpected byte 0x{actual:02X} at offset {offset} (expected 0x{expected:02X})")]
    FrameMisaligned { offset: usize, expected: u8, actual: u8 },
}

/// Readings as sent by the sensor [μg/m³] [×10].
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMeasurement {
    pub pm2_5: u16,
    pub pm10: u16,
}

/// Particulate matter concentrations.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Mass concentration PM2.5 [μg/m³]
    pub pm2_5: f64,
    /// Mass concentration PM10 [μg/m³]
    pub pm10: f64,
}

impl From<RawMeasurement> for Measurement {
    fn from(raw: RawMeasurement) -> Self {
        Self {
            pm2_5: f64::from(raw.pm2_5) / 10.0,
            pm10: f64::from(raw.pm10) / 10.0,
        }
    }
}

/// Controls how strictly a frame is validated.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Reject frames whose head, data report id or tail bytes are wrong.
    /// Off by default, in which case only the checksum is verified.
    pub check_markers: bool,
}

impl DecoderConfig {
    ///
    /// Validates markers as well as the checksum
    ///
    pub fn strict() -> Self {
        Self {
            check_markers: true,
        }
    }

    pub fn decode(&self, frame: &[u8]) -> Result<Measurement, DecodeError> {
        self.decode_raw(frame).map(Measurement::from)
    }

    ///
    /// Checks length, then markers (if enabled), then the checksum.
    /// Never reads past the end of `frame`.
    ///
    pub fn decode_raw(&self, frame: &[u8]) -> Result<RawMeasurement, DecodeError> {
        if frame.len() < MIN_FRAME_SIZE {
            return Err(DecodeError::TruncatedFrame { len: frame.len() });
        }

        if self.check_markers {
            expect_byte(frame, 0, HEAD)?;
            expect_byte(frame, 1, DATA_REPORT_ID)?;
            if frame.len() > TAIL_OFFSET {
                expect_byte(frame, TAIL_OFFSET, TAIL)?;
            }
        }

        let expected = checksum(&frame[DATA_START..CHECKSUM_OFFSET]);
        let actual = frame[CHECKSUM_OFFSET];
        if expected != actual {
            return Err(DecodeError::ChecksumMismatch { expected, actual });
        }

        let truncated = |_| DecodeError::TruncatedFrame { len: frame.len() };
        let mut offset = DATA_START;
        let pm2_5 = frame.gread_with::<u16>(&mut offset, LE).map_err(truncated)?;
        let pm10 = frame.gread_with::<u16>(&mut offset, LE).map_err(truncated)?;

        Ok(RawMeasurement { pm2_5, pm10 })
    }
}

fn expect_byte(frame: &[u8], offset: usize, expected: u8) -> Result<(), DecodeError> {
    let actual = frame[offset];
    if actual != expected {
        return Err(DecodeError::FrameMisaligned {
            offset,
            expected,
            actual,
        });
    }
    Ok(())
}

///
/// Decodes a data report, verifying only its checksum
///
pub fn decode(frame: &[u8]) -> Result<Measurement, DecodeError> {
    DecoderConfig::default().decode(frame)
}

pub fn decode_raw(frame: &[u8]) -> Result<RawMeasurement, DecodeError> {
    DecoderConfig::default().decode_raw(frame)
}

pub fn decode_with(frame: &[u8], config: &DecoderConfig) -> Result<Measurement, DecodeError> {
    config.decode(frame)
}

/// 8-bit wrapping sum of `data`.
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, byte| sum.wrapping_add(*byte))
}

///
/// Builds a well formed data report carrying `raw`
///
pub fn encode(raw: RawMeasurement) -> [u8; FRAME_SIZE] {
    let [pm2_5_lo, pm2_5_hi] = raw.pm2_5.to_le_bytes();
    let [pm10_lo, pm10_hi] = raw.pm10.to_le_bytes();

    let mut buffer = [
        HEAD,
        DATA_REPORT_ID,
        pm2_5_lo,
        pm2_5_hi,
        pm10_lo,
        pm10_hi,
        0x00,
        0x00,
        0x00,
        TAIL,
    ];
    buffer[CHECKSUM_OFFSET] = checksum(&buffer[DATA_START..CHECKSUM_OFFSET]);

    buffer
}
