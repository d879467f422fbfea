//! Genetic optimization of fixed-length chromosomes.
//!
//! The crate is generic over the [`Gene`] type: a chromosome is a `Vec<G>`,
//! and the driver, fitness strategies and stores never look inside a gene.
//!
//! # Fitness
//!
//! - [`AbsoluteFitness`] scores each chromosome on its own with a pure function.
//! - [`TournamentFitness`] plays random head-to-head matches through a
//!   [`MatchRunner`] and folds the outcomes with a [`ScoreAggregator`]
//!   ([`PointsAggregator`] or [`EloAggregator`]). [`CommandMatchRunner`] runs
//!   an external judge process.
//!
//! # Example
//!
//! ```
//! use hive_genetic::{
//!     AbsoluteFitness, GeneticAlgorithm, GeneticConfig, MemoryStore, WeightGene,
//! };
//!
//! let config = GeneticConfig {
//!     chromosome_size: 4,
//!     population_size: 10,
//!     generations_max: 5,
//!     seed: Some(1),
//!     ..GeneticConfig::default()
//! };
//! let fitness = AbsoluteFitness::new(|c: &hive_genetic::Chromosome<WeightGene>| {
//!     -c.genes().iter().map(|g| g.value().abs()).sum::<f64>()
//! });
//! let mut ga = GeneticAlgorithm::new(config, fitness, MemoryStore::<WeightGene>::default());
//! let best = ga.run(|report, _| println!("{}: {}", report.generation, report.best_score))?;
//! assert_eq!(best.len(), 4);
//! # Ok::<(), hive_genetic::StoreError>(())
//! ```

pub use self::{
    algorithm::{GenerationReport, GeneticAlgorithm, normalize},
    chromosome::{Chromosome, ChromosomeId, DecodeChromosomeError},
    config::{GeneticConfig, TournamentConfig},
    fitness::{AbsoluteFitness, FitnessEvaluator},
    gene::{Encoding, Gene, ParseGeneError, SynapseGene, ThrustGene, WeightGene},
    population::Population,
    runner::{CommandMatchRunner, Payload},
    schedule::RatioSchedule,
    store::{ChromosomeStore, DirectoryStore, MemoryStore, StoreError},
    tournament::{
        EloAggregator, MatchError, MatchOutcome, MatchRunner, PointsAggregator, ScoreAggregator,
        TournamentFitness, parse_score_line,
    },
};

pub mod algorithm;
pub mod chromosome;
pub mod config;
pub mod fitness;
pub mod gene;
pub mod population;
pub mod runner;
pub mod schedule;
pub mod store;
pub mod tournament;
