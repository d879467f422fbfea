//! Weighted factors driving every planner decision.
//!
//! The planner never hard-codes its coefficients. Each decision reads a
//! *factor*: the dot product of one row of [`PlannerWeights`] with the current
//! [`GameInputs`], clamped into the factor's range. The weights are the
//! vector the genetic optimizer evolves, so path selection, ranking and beacon
//! strength are all learned behaviour.

use std::{fmt, num::ParseFloatError, str::FromStr};

use serde::{Deserialize, Serialize};

/// Number of game-state inputs per factor row.
pub const INPUT_COUNT: usize = 8;

/// Number of factors the planner reads.
pub const FACTOR_COUNT: usize = 12;

/// Total length of a weights vector.
pub const WEIGHTS_COUNT: usize = INPUT_COUNT * FACTOR_COUNT;

const DEFAULT_WEIGHTS: [f64; WEIGHTS_COUNT] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.1, //
    100.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
    1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
    4.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
    1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
    1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, //
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
];

/// Clamps `value` into `[min, max]`, with `min` winning when the bounds cross.
///
/// Unlike [`f64::clamp`] this never panics, which matters for ranges whose
/// upper bound comes from the game (e.g. the number of ants left).
#[must_use]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

/// A planner decision read from one row of the weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Factor {
    /// Upper bound on the number of paths committed per turn.
    MaxPaths,
    EggPriority,
    CrystalPriority,
    /// Exponent applied to the path length when ranking targets.
    PathLengthExponent,
    CrystalDiscount,
    CrystalDiscountDivisorA,
    CrystalDiscountDivisorB,
    EggDiscount,
    EggDiscountDivisorA,
    EggDiscountDivisorB,
    StrengthScale,
    /// Exponent applied to the base distance when computing beacon strength.
    StrengthDistanceExponent,
}

impl Factor {
    pub const ALL: [Self; FACTOR_COUNT] = [
        Self::MaxPaths,
        Self::EggPriority,
        Self::CrystalPriority,
        Self::PathLengthExponent,
        Self::CrystalDiscount,
        Self::CrystalDiscountDivisorA,
        Self::CrystalDiscountDivisorB,
        Self::EggDiscount,
        Self::EggDiscountDivisorA,
        Self::EggDiscountDivisorB,
        Self::StrengthScale,
        Self::StrengthDistanceExponent,
    ];

    /// Row of this factor in the weights vector.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Static clamp range.
    ///
    /// [`Factor::MaxPaths`] is further capped by the ants available, see
    /// [`Factors::max_paths`].
    #[must_use]
    pub fn range(self) -> (f64, f64) {
        match self {
            Self::MaxPaths => (1.0, f64::INFINITY),
            Self::EggPriority => (0.0, 1000.0),
            Self::CrystalPriority => (0.0, 100.0),
            Self::PathLengthExponent
            | Self::CrystalDiscount
            | Self::EggDiscount
            | Self::StrengthScale => (0.0, 10.0),
            Self::CrystalDiscountDivisorA
            | Self::CrystalDiscountDivisorB
            | Self::EggDiscountDivisorA
            | Self::EggDiscountDivisorB => (1.0, 100.0),
            Self::StrengthDistanceExponent => (-2.0, 2.0),
        }
    }
}

/// Game-state inputs every factor row is multiplied with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GameInputs {
    pub bases: usize,
    pub crystal_cells: usize,
    pub egg_cells: usize,
    /// Crystals observed over the whole game so far.
    pub total_crystals: u64,
    /// Eggs observed over the whole game so far.
    pub total_eggs: u64,
    /// Resources on the board this turn.
    pub total_resources: u64,
    pub total_my_ants: u64,
}

impl GameInputs {
    /// Input vector, led by the constant bias term.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn to_vector(&self) -> [f64; INPUT_COUNT] {
        [
            1.0,
            self.bases as f64,
            self.crystal_cells as f64,
            self.egg_cells as f64,
            self.total_crystals as f64,
            self.total_eggs as f64,
            self.total_resources as f64,
            self.total_my_ants as f64,
        ]
    }
}

/// Planner weights: [`FACTOR_COUNT`] rows of [`INPUT_COUNT`] coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct PlannerWeights(Vec<f64>);

impl Default for PlannerWeights {
    fn default() -> Self {
        Self(DEFAULT_WEIGHTS.to_vec())
    }
}

/// Error parsing or building [`PlannerWeights`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParseWeightsError {
    #[display("expected {} weights, got {actual}", WEIGHTS_COUNT)]
    Length { actual: usize },
    #[display("invalid weight #{index}")]
    Value {
        index: usize,
        source: ParseFloatError,
    },
}

impl TryFrom<Vec<f64>> for PlannerWeights {
    type Error = ParseWeightsError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        if values.len() != WEIGHTS_COUNT {
            return Err(ParseWeightsError::Length {
                actual: values.len(),
            });
        }
        Ok(Self(values))
    }
}

impl From<PlannerWeights> for Vec<f64> {
    fn from(weights: PlannerWeights) -> Self {
        weights.0
    }
}

impl FromStr for PlannerWeights {
    type Err = ParseWeightsError;

    /// Parses the comma-separated encoding written by the trainer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .trim()
            .split(',')
            .enumerate()
            .map(|(index, v)| {
                v.trim()
                    .parse()
                    .map_err(|source| ParseWeightsError::Value { index, source })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        Self::try_from(values)
    }
}

impl fmt::Display for PlannerWeights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, w) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{w}")?;
        }
        Ok(())
    }
}

impl PlannerWeights {
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Raw (unclamped) value of `factor` for `inputs`.
    #[must_use]
    pub fn weighted(&self, factor: Factor, inputs: &[f64; INPUT_COUNT]) -> f64 {
        let row = &self.0[factor.index() * INPUT_COUNT..][..INPUT_COUNT];
        row.iter().zip(inputs).map(|(w, x)| w * x).sum()
    }

    /// Resolves every factor for one turn.
    #[must_use]
    pub fn resolve(&self, inputs: &GameInputs) -> Factors {
        let vector = inputs.to_vector();
        let mut values = [0.0; FACTOR_COUNT];
        for factor in Factor::ALL {
            let (min, max) = factor.range();
            values[factor.index()] = clamp(self.weighted(factor, &vector), min, max);
        }
        Factors {
            values,
            ants: inputs.total_my_ants,
        }
    }
}

/// Clamped factor values for a single turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Factors {
    values: [f64; FACTOR_COUNT],
    ants: u64,
}

impl Factors {
    #[must_use]
    pub fn get(&self, factor: Factor) -> f64 {
        self.values[factor.index()]
    }

    /// Maximum number of paths to commit this turn (at least 1).
    #[expect(clippy::cast_precision_loss)]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn max_paths(&self) -> usize {
        clamp(self.get(Factor::MaxPaths), 1.0, self.ants as f64).floor() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_crossed_bounds() {
        assert!((clamp(5.0, 1.0, 0.0) - 1.0).abs() < f64::EPSILON);
        assert!((clamp(-3.0, 0.0, 10.0)).abs() < f64::EPSILON);
        assert!((clamp(3.0, 0.0, 10.0) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_factor_rows_are_ordered() {
        for (i, factor) in Factor::ALL.into_iter().enumerate() {
            assert_eq!(factor.index(), i);
        }
    }

    #[test]
    fn test_default_factors() {
        let inputs = GameInputs {
            bases: 1,
            crystal_cells: 3,
            egg_cells: 2,
            total_crystals: 40,
            total_eggs: 10,
            total_resources: 50,
            total_my_ants: 30,
        };
        let factors = PlannerWeights::default().resolve(&inputs);

        assert!((factors.get(Factor::EggPriority) - 100.0).abs() < 1e-9);
        assert!((factors.get(Factor::CrystalPriority) - 1.0).abs() < 1e-9);
        assert!((factors.get(Factor::PathLengthExponent) - 4.0).abs() < 1e-9);
        // divisor weighted on total resources, clamped to 100
        assert!((factors.get(Factor::CrystalDiscountDivisorA) - 50.0).abs() < 1e-9);
        assert!((factors.get(Factor::EggDiscountDivisorB) - 30.0).abs() < 1e-9);
        assert!(factors.get(Factor::StrengthScale).abs() < 1e-9);
        // 0.1 * 30 ants
        assert_eq!(factors.max_paths(), 3);
    }

    #[test]
    fn test_max_paths_without_ants() {
        let factors = PlannerWeights::default().resolve(&GameInputs::default());
        assert_eq!(factors.max_paths(), 1);
    }

    #[test]
    fn test_parse_weights() {
        let text = PlannerWeights::default().to_string();
        let parsed: PlannerWeights = text.parse().unwrap();
        assert_eq!(parsed, PlannerWeights::default());

        assert_eq!(
            "1,2,3".parse::<PlannerWeights>(),
            Err(ParseWeightsError::Length { actual: 3 })
        );
        assert!(matches!(
            "1,x".parse::<PlannerWeights>(),
            Err(ParseWeightsError::Value { index: 1, .. })
        ));
    }

    #[test]
    fn test_deserialize_checks_length() {
        assert!(serde_json::from_str::<PlannerWeights>("[1.0, 2.0]").is_err());
        let json = serde_json::to_string(&PlannerWeights::default()).unwrap();
        assert_eq!(
            serde_json::from_str::<PlannerWeights>(&json).unwrap(),
            PlannerWeights::default()
        );
    }
}
