//! The evolvable unit.
//!
//! A [`Gene`] knows how to draw itself at random, blend with a partner and
//! mutate in place. Both optionally look at the *previous* gene of the same
//! chromosome, which lets sequence-shaped genes (one per turn, say) stay
//! continuous instead of jumping anywhere in their range.
//!
//! Genes are plain values: deriving a chromosome clones them, so children never
//! alias their parents.
//!
//! # Provided genes
//!
//! - [`WeightGene`]: sparse real weight in `[-500, 500]`, blended by interpolation.
//! - [`SynapseGene`]: quantized `[0, 1]` weight, discrete crossover, one byte per gene.
//! - [`ThrustGene`]: `(rotate, power)` pair drawn relative to the previous gene.

use std::{
    fmt,
    num::{ParseFloatError, ParseIntError},
    str::FromStr,
};

use rand::Rng;

pub use self::{synapse::SynapseGene, thrust::ThrustGene, weight::WeightGene};

mod synapse;
mod thrust;
mod weight;

/// How the genes of a chromosome are joined into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// One token per gene, joined with `,`.
    Delimited,
    /// One printable character per gene, no separator.
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParseGeneError {
    #[display("invalid number `{token}`")]
    Float {
        token: String,
        source: ParseFloatError,
    },
    #[display("invalid integer `{token}`")]
    Int {
        token: String,
        source: ParseIntError,
    },
    #[display("`{token}` is not a valid gene")]
    Invalid { token: String },
}

/// Smallest evolvable unit.
///
/// The text form (`Display` / `FromStr`) is one token of the chromosome
/// encoding and must round-trip exactly.
pub trait Gene:
    Clone
    + PartialEq
    + fmt::Debug
    + fmt::Display
    + FromStr<Err = ParseGeneError>
    + Send
    + Sync
    + 'static
{
    const ENCODING: Encoding;

    /// Draws a gene, optionally relative to the one before it.
    fn random<R>(rng: &mut R, previous: Option<&Self>) -> Self
    where
        R: Rng + ?Sized;

    /// Produces two children from `self` and `other`.
    ///
    /// Interpolating genes return `weight * self + inv_weight * other` and the
    /// mirrored blend; discrete genes ignore the weights and pick a parent
    /// value per child. Neither parent is modified.
    fn crossover<R>(&self, other: &Self, weight: f64, inv_weight: f64, rng: &mut R) -> (Self, Self)
    where
        R: Rng + ?Sized;

    /// Replaces the value with a new draw.
    fn mutate<R>(&mut self, rng: &mut R, previous: Option<&Self>)
    where
        R: Rng + ?Sized;
}
