use std::{fmt, ops::RangeInclusive, str::FromStr};

use rand::Rng;

use super::{Encoding, Gene, ParseGeneError};

/// One turn of a lander command: a tilt angle and an engine power.
///
/// Consecutive genes describe consecutive turns, and the ship can only change
/// by a bounded step per turn. Draws are therefore relative to the previous
/// gene, which keeps a random chromosome flyable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThrustGene {
    rotate: i32,
    power: i32,
}

impl ThrustGene {
    pub const ROTATE: RangeInclusive<i32> = -90..=90;
    pub const ROTATE_STEP: RangeInclusive<i32> = -15..=15;
    pub const POWER: RangeInclusive<i32> = 0..=4;
    pub const POWER_STEP: RangeInclusive<i32> = -1..=1;

    #[must_use]
    pub fn new(rotate: i32, power: i32) -> Self {
        Self {
            rotate: rotate.clamp(*Self::ROTATE.start(), *Self::ROTATE.end()),
            power: power.clamp(*Self::POWER.start(), *Self::POWER.end()),
        }
    }

    #[must_use]
    pub fn rotate(self) -> i32 {
        self.rotate
    }

    #[must_use]
    pub fn power(self) -> i32 {
        self.power
    }
}

impl fmt::Display for ThrustGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.rotate, self.power)
    }
}

impl FromStr for ThrustGene {
    type Err = ParseGeneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |token: &str| {
            token.parse::<i32>().map_err(|source| ParseGeneError::Int {
                token: token.to_owned(),
                source,
            })
        };
        let mut tokens = s.split_whitespace();
        let (Some(rotate), Some(power), None) = (tokens.next(), tokens.next(), tokens.next()) else {
            return Err(ParseGeneError::Invalid {
                token: s.to_owned(),
            });
        };
        Ok(Self::new(parse(rotate)?, parse(power)?))
    }
}

#[expect(clippy::cast_possible_truncation)]
fn blend(a: i32, b: i32, weight: f64, inv_weight: f64) -> i32 {
    (f64::from(a) * weight + f64::from(b) * inv_weight).round() as i32
}

impl Gene for ThrustGene {
    const ENCODING: Encoding = Encoding::Delimited;

    fn random<R>(rng: &mut R, previous: Option<&Self>) -> Self
    where
        R: Rng + ?Sized,
    {
        let base = previous.copied().unwrap_or(Self { rotate: 0, power: 0 });
        Self::new(
            base.rotate + rng.random_range(Self::ROTATE_STEP),
            base.power + rng.random_range(Self::POWER_STEP),
        )
    }

    fn crossover<R>(&self, other: &Self, weight: f64, inv_weight: f64, _rng: &mut R) -> (Self, Self)
    where
        R: Rng + ?Sized,
    {
        (
            Self::new(
                blend(self.rotate, other.rotate, weight, inv_weight),
                blend(self.power, other.power, weight, inv_weight),
            ),
            Self::new(
                blend(self.rotate, other.rotate, inv_weight, weight),
                blend(self.power, other.power, inv_weight, weight),
            ),
        )
    }

    fn mutate<R>(&mut self, rng: &mut R, previous: Option<&Self>)
    where
        R: Rng + ?Sized,
    {
        *self = Self::random(rng, previous);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    use super::*;

    #[test]
    fn test_random_follows_previous() {
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        let mut previous: Option<ThrustGene> = None;
        for _ in 0..500 {
            let gene = ThrustGene::random(&mut rng, previous.as_ref());
            assert!(ThrustGene::ROTATE.contains(&gene.rotate()));
            assert!(ThrustGene::POWER.contains(&gene.power()));
            let base = previous.unwrap_or(ThrustGene::new(0, 0));
            assert!((gene.rotate() - base.rotate()).abs() <= 15);
            assert!((gene.power() - base.power()).abs() <= 1);
            previous = Some(gene);
        }
    }

    #[test]
    fn test_crossover_rounds_and_mirrors() {
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let a = ThrustGene::new(-45, 4);
        let b = ThrustGene::new(30, 0);
        assert_eq!(a.crossover(&b, 1.0, 0.0, &mut rng), (a, b));

        let (c, d) = a.crossover(&b, 0.25, 0.75, &mut rng);
        // -11.25 + 22.5, 1 + 0
        assert_eq!(c, ThrustGene::new(11, 1));
        // -33.75 + 7.5, 3 + 0
        assert_eq!(d, ThrustGene::new(-26, 3));
    }

    #[test]
    fn test_text_roundtrip() {
        let gene = ThrustGene::new(-15, 3);
        assert_eq!(gene.to_string(), "-15 3");
        assert_eq!("-15 3".parse::<ThrustGene>(), Ok(gene));
        assert_eq!("200 9".parse::<ThrustGene>(), Ok(ThrustGene::new(90, 4)));
        assert!(matches!(
            "1".parse::<ThrustGene>(),
            Err(ParseGeneError::Invalid { .. })
        ));
        assert!(matches!(
            "1 x".parse::<ThrustGene>(),
            Err(ParseGeneError::Int { .. })
        ));
    }
}
