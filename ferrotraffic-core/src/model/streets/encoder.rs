//! Bit-packed edge speed storage

use crate::{Error, Speed};

/// Packed per-edge state word
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EdgeFlags(pub u64);

/// Stores a speed in the low `bits` of an [`EdgeFlags`] word with a resolution
/// of `factor` km/h. Remaining bits are left untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedEncoder {
    bits: u32,
    factor: f64,
}

impl Default for SpeedEncoder {
    /// Car profile: 5 bits with 5 km/h steps, up to 155 km/h
    fn default() -> Self {
        Self {
            bits: 5,
            factor: 5.0,
        }
    }
}

impl SpeedEncoder {
    /// # Errors
    ///
    /// Returns `InvalidData` if `bits` is not within `1..=32` or `factor` is not a
    /// positive finite number
    pub fn new(bits: u32, factor: f64) -> Result<Self, Error> {
        if !(1..=32).contains(&bits) {
            return Err(Error::InvalidData(format!(
                "speed bits must be within 1..=32, got {bits}"
            )));
        }
        if !factor.is_finite() || factor <= 0.0 {
            return Err(Error::InvalidData(format!(
                "speed factor must be positive, got {factor}"
            )));
        }
        Ok(Self { bits, factor })
    }

    fn mask(&self) -> u64 {
        (1u64 << self.bits) - 1
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn max_speed(&self) -> Speed {
        self.mask() as f64 * self.factor
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn steps(&self, speed: Speed) -> Result<u64, Error> {
        if speed.is_nan() || speed < 0.0 {
            return Err(Error::InvalidSpeed(speed));
        }
        let speed = speed.min(self.max_speed());
        Ok((speed / self.factor).round() as u64)
    }

    /// Speed as it would be read back after storing it
    ///
    /// # Errors
    ///
    /// Returns `InvalidSpeed` for negative or NaN speeds
    #[allow(clippy::cast_precision_loss)]
    pub fn quantize(&self, speed: Speed) -> Result<Speed, Error> {
        Ok(self.steps(speed)? as f64 * self.factor)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn speed(&self, flags: EdgeFlags) -> Speed {
        (flags.0 & self.mask()) as f64 * self.factor
    }

    /// # Errors
    ///
    /// Returns `InvalidSpeed` for negative or NaN speeds
    pub fn set_speed(&self, flags: EdgeFlags, speed: Speed) -> Result<EdgeFlags, Error> {
        let steps = self.steps(speed)?;
        Ok(EdgeFlags((flags.0 & !self.mask()) | steps))
    }
}
