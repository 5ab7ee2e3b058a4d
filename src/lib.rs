use embedded_hal::serial::Read;
use nb::block;
use tracing::{debug, trace};

mod frame;

pub use frame::{
    checksum, decode, decode_raw, decode_with, encode, DecodeError, DecoderConfig, Measurement,
    RawMeasurement, DATA_REPORT_ID, FRAME_SIZE, HEAD, MIN_FRAME_SIZE, TAIL,
};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error<E> {
    #[error("serial read failed: {0:?}")]
    Serial(E),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

///
/// Reads data reports from a sensor whose serial stream is already aligned on frame boundaries.
///
pub struct Sds011Sensor<Serial>
where
    Serial: Read<u8>,
{
    serial: Serial,
    config: DecoderConfig,
}

impl<Serial> Sds011Sensor<Serial>
where
    Serial: Read<u8>,
    Serial::Error: core::fmt::Debug,
{
    ///
    /// Creates a new sensor instance that validates frame markers as well as the checksum
    ///
    pub fn new(serial: Serial) -> Self {
        Self::with_config(serial, DecoderConfig::strict())
    }

    pub fn with_config(serial: Serial, config: DecoderConfig) -> Self {
        Self { serial, config }
    }

    ///
    /// Reads one frame and decodes it. Blocks until all bytes are available.
    ///
    /// A rejected frame is reported as an error; the next call reads the next frame.
    ///
    pub fn read(&mut self) -> Result<Measurement, Error<Serial::Error>> {
        let buffer = self.read_frame()?;

        self.config.decode(&buffer).map_err(|e| {
            debug!(error = %e, frame = ?buffer, "rejected sds011 frame");
            Error::from(e)
        })
    }

    ///
    /// Reads `FRAME_SIZE` bytes without decoding them
    ///
    pub fn read_frame(&mut self) -> Result<[u8; FRAME_SIZE], Error<Serial::Error>> {
        let mut buffer = [0_u8; FRAME_SIZE];

        for byte in buffer.iter_mut() {
            *byte = self.read_byte()?;
        }

        trace!(frame = ?buffer, "sds011 frame read");
        Ok(buffer)
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    ///
    /// Releases the serial port
    ///
    pub fn free(self) -> Serial {
        self.serial
    }

    fn read_byte(&mut self) -> Result<u8, Error<Serial::Error>> {
        block!(self.serial.read()).map_err(Error::Serial)
    }
}
