use std::{fmt, str::FromStr};

use rand::Rng;

use super::{Encoding, Gene, ParseGeneError};

/// Network weight in `[0, 1]`, quantized to [`SynapseGene::LEVELS`] steps.
///
/// Each level maps to one printable ASCII character (`'!'` to `'~'`), so a
/// whole network fits on a single command-line argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SynapseGene(u8);

impl SynapseGene {
    pub const LEVELS: u8 = 94;
    const FIRST_CHAR: u8 = b'!';

    /// # Panics
    ///
    /// Panics if `level` is not below [`SynapseGene::LEVELS`].
    #[must_use]
    pub fn from_level(level: u8) -> Self {
        assert!(level < Self::LEVELS, "synapse level {level} out of range");
        Self(level)
    }

    /// Nearest level to `value`, clamped into `[0, 1]`.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn from_value(value: f64) -> Self {
        let max = f64::from(Self::LEVELS - 1);
        Self((value.clamp(0.0, 1.0) * max).round() as u8)
    }

    #[must_use]
    pub fn level(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn value(self) -> f64 {
        f64::from(self.0) / f64::from(Self::LEVELS - 1)
    }

    #[must_use]
    pub fn to_char(self) -> char {
        char::from(Self::FIRST_CHAR + self.0)
    }
}

impl fmt::Display for SynapseGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl FromStr for SynapseGene {
    type Err = ParseGeneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseGeneError::Invalid {
            token: s.to_owned(),
        };
        let [byte] = s.as_bytes() else {
            return Err(invalid());
        };
        let level = byte.checked_sub(Self::FIRST_CHAR).ok_or_else(invalid)?;
        if level >= Self::LEVELS {
            return Err(invalid());
        }
        Ok(Self(level))
    }
}

impl Gene for SynapseGene {
    const ENCODING: Encoding = Encoding::Compact;

    fn random<R>(rng: &mut R, _previous: Option<&Self>) -> Self
    where
        R: Rng + ?Sized,
    {
        Self(rng.random_range(0..Self::LEVELS))
    }

    fn crossover<R>(
        &self,
        other: &Self,
        _weight: f64,
        _inv_weight: f64,
        rng: &mut R,
    ) -> (Self, Self)
    where
        R: Rng + ?Sized,
    {
        let mut pick = || if rng.random_bool(0.5) { *self } else { *other };
        (pick(), pick())
    }

    fn mutate<R>(&mut self, rng: &mut R, previous: Option<&Self>)
    where
        R: Rng + ?Sized,
    {
        *self = Self::random(rng, previous);
    }
}
