use std::{fmt, str::FromStr};

use rand::Rng;

use super::{Encoding, Gene, ParseGeneError};

/// Real-valued weight, kept in `[MIN, MAX]` and rounded to [`WeightGene::DECIMALS`] places.
///
/// Random draws are sparse: most weights start at exactly zero, some near zero
/// and a few anywhere in range, so a fresh planner begins close to "ignore this
/// input" rather than with noise on every factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightGene(f64);

impl WeightGene {
    pub const MIN: f64 = -500.0;
    pub const MAX: f64 = 500.0;
    pub const DECIMALS: i32 = 5;

    #[must_use]
    pub fn new(value: f64) -> Self {
        let scale = 10f64.powi(Self::DECIMALS);
        let value = value.clamp(Self::MIN, Self::MAX);
        Self((value * scale).round() / scale)
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for WeightGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WeightGene {
    type Err = ParseGeneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<f64>().map_err(|source| ParseGeneError::Float {
            token: s.to_owned(),
            source,
        })?;
        if !value.is_finite() {
            return Err(ParseGeneError::Invalid {
                token: s.to_owned(),
            });
        }
        Ok(Self::new(value))
    }
}

impl Gene for WeightGene {
    const ENCODING: Encoding = Encoding::Delimited;

    fn random<R>(rng: &mut R, _previous: Option<&Self>) -> Self
    where
        R: Rng + ?Sized,
    {
        // 2 : 2 : 6 between full range, near zero and zero
        let value = match rng.random_range(0..10) {
            0 | 1 => rng.random_range(Self::MIN..=Self::MAX),
            2 | 3 => rng.random_range(-1.0..=1.0),
            _ => 0.0,
        };
        Self::new(value)
    }

    fn crossover<R>(&self, other: &Self, weight: f64, inv_weight: f64, _rng: &mut R) -> (Self, Self)
    where
        R: Rng + ?Sized,
    {
        (
            Self::new(weight * self.0 + inv_weight * other.0),
            Self::new(inv_weight * self.0 + weight * other.0),
        )
    }

    fn mutate<R>(&mut self, rng: &mut R, _previous: Option<&Self>)
    where
        R: Rng + ?Sized,
    {
        let delta = (self.0.abs() * 0.1).max(0.5);
        *self = Self::new(rng.random_range(self.0 - delta..=self.0 + delta));
    }
}
