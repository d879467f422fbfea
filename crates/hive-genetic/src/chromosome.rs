use std::{fmt, num::ParseIntError, str::FromStr};

use rand::{Rng, seq::index};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::gene::{Encoding, Gene, ParseGeneError};

/// Lower bound of the shared crossover weight.
///
/// Weights are drawn from `[CROSSOVER_WEIGHT_MIN, 1 - CROSSOVER_WEIGHT_MIN]` so
/// children are never a plain copy of one parent.
pub const CROSSOVER_WEIGHT_MIN: f64 = 0.02;

/// Identity of a chromosome, stable across elite carry-overs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChromosomeId(u64);

impl ChromosomeId {
    pub fn random<R>(rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self(rng.random())
    }
}

impl fmt::Display for ChromosomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for ChromosomeId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16).map(Self)
    }
}

impl Serialize for ChromosomeId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChromosomeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum DecodeChromosomeError {
    #[display("gene #{index}")]
    Gene {
        index: usize,
        source: ParseGeneError,
    },
    #[display("expected {expected} genes, got {actual}")]
    Length { expected: usize, actual: usize },
}

/// Fixed-length sequence of genes with an identity and a birth generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome<G> {
    id: ChromosomeId,
    generation: u32,
    genes: Vec<G>,
    last_score: Option<f64>,
}

impl<G> Chromosome<G>
where
    G: Gene,
{
    /// Creates a chromosome with a fresh identity.
    pub fn new<R>(rng: &mut R, generation: u32, genes: Vec<G>) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::with_id(ChromosomeId::random(rng), generation, genes)
    }

    #[must_use]
    pub fn with_id(id: ChromosomeId, generation: u32, genes: Vec<G>) -> Self {
        Self {
            id,
            generation,
            genes,
            last_score: None,
        }
    }

    /// Draws `size` genes, each relative to the one before.
    pub fn random<R>(rng: &mut R, generation: u32, size: usize) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut genes: Vec<G> = Vec::with_capacity(size);
        for _ in 0..size {
            let gene = G::random(rng, genes.last());
            genes.push(gene);
        }
        Self::new(rng, generation, genes)
    }

    #[must_use]
    pub fn id(&self) -> ChromosomeId {
        self.id
    }

    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[must_use]
    pub fn genes(&self) -> &[G] {
        &self.genes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Score carried from the last evaluation, if any.
    #[must_use]
    pub fn last_score(&self) -> Option<f64> {
        self.last_score
    }

    pub fn set_last_score(&mut self, score: f64) {
        self.last_score = Some(score);
    }

    /// Copy kept into the next generation with the same identity.
    ///
    /// The carried score is multiplied by `score_ratio` so old ratings fade.
    #[must_use]
    pub fn carry_over(&self, score_ratio: f64) -> Self {
        Self {
            last_score: self.last_score.map(|s| s * score_ratio),
            ..self.clone()
        }
    }

    /// Gives the chromosome a new identity in `generation`, dropping its score.
    pub fn renew<R>(&mut self, rng: &mut R, generation: u32)
    where
        R: Rng + ?Sized,
    {
        self.id = ChromosomeId::random(rng);
        self.generation = generation;
        self.last_score = None;
    }

    /// Blends two parents gene by gene with one shared weight.
    ///
    /// # Panics
    ///
    /// Panics if the parents differ in length.
    pub fn crossover<R>(&self, other: &Self, generation: u32, rng: &mut R) -> (Self, Self)
    where
        R: Rng + ?Sized,
    {
        assert_eq!(
            self.genes.len(),
            other.genes.len(),
            "crossover between chromosomes of different lengths"
        );
        let weight = rng.random_range(CROSSOVER_WEIGHT_MIN..=1.0 - CROSSOVER_WEIGHT_MIN);
        let inv_weight = 1.0 - weight;
        let (genes_1, genes_2) = self
            .genes
            .iter()
            .zip(&other.genes)
            .map(|(a, b)| a.crossover(b, weight, inv_weight, rng))
            .unzip();
        (
            Self::new(rng, generation, genes_1),
            Self::new(rng, generation, genes_2),
        )
    }

    /// Mutates `ceil(len * ratio)` distinct positions, each with its
    /// predecessor (if any) as context.
    pub fn mutate<R>(&mut self, ratio: f64, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let len = self.genes.len();
        let count = mutation_count(len, ratio);
        for i in index::sample(rng, len, count) {
            let (head, tail) = self.genes.split_at_mut(i);
            tail[0].mutate(rng, head.last());
        }
    }

    /// Text form of the genes, as passed to match runners and saved to disk.
    #[must_use]
    pub fn encode(&self) -> String {
        let separator = match G::ENCODING {
            Encoding::Delimited => ",",
            Encoding::Compact => "",
        };
        self.genes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Inverse of [`Chromosome::encode`].
    pub fn decode(
        id: ChromosomeId,
        generation: u32,
        text: &str,
    ) -> Result<Self, DecodeChromosomeError> {
        let text = text.trim();
        let parse = |(index, token): (usize, &str)| {
            token
                .parse::<G>()
                .map_err(|source| DecodeChromosomeError::Gene { index, source })
        };
        let genes = match G::ENCODING {
            Encoding::Delimited if text.is_empty() => vec![],
            Encoding::Delimited => text
                .split(',')
                .map(str::trim)
                .enumerate()
                .map(parse)
                .collect::<Result<_, _>>()?,
            Encoding::Compact => text
                .char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .enumerate()
                .map(parse)
                .collect::<Result<_, _>>()?,
        };
        Ok(Self::with_id(id, generation, genes))
    }

    /// File name used when the chromosome is written to disk.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.file_name_at(self.generation)
    }

    /// File name of this chromosome checkpointed at `generation`.
    #[must_use]
    pub fn file_name_at(&self, generation: u32) -> String {
        format!("{generation:05}_{}.txt", self.id)
    }

    /// Parses a name produced by [`Chromosome::file_name`] into `(generation, id)`.
    #[must_use]
    pub fn parse_file_name(name: &str) -> Option<(u32, ChromosomeId)> {
        let stem = name.strip_suffix(".txt")?;
        let (generation, id) = stem.split_once('_')?;
        Some((generation.parse().ok()?, id.parse().ok()?))
    }
}

#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn mutation_count(len: usize, ratio: f64) -> usize {
    ((len as f64 * ratio).ceil() as usize).min(len)
}
