use core::fmt;

use crate::calibration::IntegrityError;

/// Driver error, generic over the bus error `E`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The transport failed to talk to the sensor.
    I2c(E),
    /// PROM contents failed the CRC4 check. The sensor must be re-initialized
    /// before any reading is taken.
    Integrity(IntegrityError),
    /// Oversampling index outside 0..=5.
    InvalidOversampling(u8),
}

/// Oversampling index outside 0..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidOversampling(pub u8);

impl<E> From<IntegrityError> for Error<E> {
    fn from(e: IntegrityError) -> Self {
        Error::Integrity(e)
    }
}

impl<E> From<InvalidOversampling> for Error<E> {
    fn from(e: InvalidOversampling) -> Self {
        Error::InvalidOversampling(e.0)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "i2c error: {e:?}"),
            Error::Integrity(e) => write!(f, "{e}"),
            Error::InvalidOversampling(i) => write!(f, "invalid oversampling option {i}"),
        }
    }
}

impl fmt::Display for InvalidOversampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid oversampling option {}", self.0)
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}

impl core::error::Error for InvalidOversampling {}
