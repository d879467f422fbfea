use serde::{Deserialize, Serialize};

/// A probability that may change over the run.
///
/// `progress` is `generation / generations_max`, so a linear schedule moves
/// from `start` at the first generation to `end` at the last.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RatioSchedule {
    Constant { value: f64 },
    Linear { start: f64, end: f64 },
}

impl RatioSchedule {
    /// Value at `progress`, clamped into `[0, 1]`.
    #[must_use]
    pub fn at(&self, progress: f64) -> f64 {
        let progress = progress.clamp(0.0, 1.0);
        let value = match *self {
            Self::Constant { value } => value,
            Self::Linear { start, end } => start + (end - start) * progress,
        };
        value.clamp(0.0, 1.0)
    }

    /// Returns `true` if every value the schedule can produce is a probability.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let probability = |v: f64| (0.0..=1.0).contains(&v);
        match *self {
            Self::Constant { value } => probability(value),
            Self::Linear { start, end } => probability(start) && probability(end),
        }
    }
}
