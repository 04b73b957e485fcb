//! Printable signature format.
//!
//! ```text
//! iqdb_ <avg Y:16> <avg I:16> <avg Q:16> <Y coef:4 ×40> <I coef:4 ×40> <Q coef:4 ×40>
//! ```
//!
//! Averages are the IEEE-754 bit patterns of the `f64` values, coefficients
//! the two's-complement bit patterns of the `i16` values, all as lowercase
//! zero-padded hex. Parsing accepts the body with or without the prefix and
//! ignores anything after the last coefficient.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::{Signature, NUM_CHANNELS, NUM_COEFS, PREFIX};
use crate::error::FormatError;

const AVERAGE_DIGITS: usize = 16;
const COEFFICIENT_DIGITS: usize = 4;

/// Cursor over the hex body of a signature string.
struct HexReader<'a> {
    body: &'a [u8],
    offset: usize,
}

impl<'a> HexReader<'a> {
    fn new(body: &'a str) -> Self {
        Self {
            body: body.as_bytes(),
            offset: 0,
        }
    }

    /// Consume exactly `digits` hex characters and return their value.
    fn read(&mut self, digits: usize, field: &'static str) -> Result<u64, FormatError> {
        let remaining = self.body.len() - self.offset;
        if remaining < digits {
            return Err(FormatError::Truncated {
                field,
                offset: self.offset,
                needed: digits,
                remaining,
            });
        }

        let chunk = &self.body[self.offset..self.offset + digits];
        let value = chunk
            .iter()
            .try_fold(0u64, |acc, &b| {
                char::from(b).to_digit(16).map(|d| (acc << 4) | u64::from(d))
            })
            .ok_or_else(|| FormatError::InvalidHex {
                field,
                offset: self.offset,
                chunk: String::from_utf8_lossy(chunk).into_owned(),
            })?;

        self.offset += digits;
        Ok(value)
    }
}

impl Signature {
    /// Parse a signature from its printable form.
    ///
    /// The `iqdb_` prefix is optional. No partial signature is produced on
    /// failure.
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        let body = text.strip_prefix(PREFIX).unwrap_or(text);
        let mut reader = HexReader::new(body);

        let mut averages = [0.0; NUM_CHANNELS];
        for average in &mut averages {
            *average = f64::from_bits(reader.read(AVERAGE_DIGITS, "averages")?);
        }

        let mut coefficients = [[0i16; NUM_COEFS]; NUM_CHANNELS];
        for channel in &mut coefficients {
            for coefficient in channel.iter_mut() {
                *coefficient = reader.read(COEFFICIENT_DIGITS, "coefficients")? as u16 as i16;
            }
        }

        Ok(Self {
            averages,
            coefficients,
        })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(PREFIX)?;
        for average in &self.averages {
            write!(f, "{:016x}", average.to_bits())?;
        }
        for channel in &self.coefficients {
            for &coefficient in channel {
                write!(f, "{:04x}", coefficient as u16)?;
            }
        }
        Ok(())
    }
}

impl FromStr for Signature {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hash = String::deserialize(deserializer)?;
        Self::parse(&hash).map_err(de::Error::custom)
    }
}
