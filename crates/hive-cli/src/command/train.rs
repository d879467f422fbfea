use std::path::PathBuf;

use anyhow::Context;
use hive_genetic::{
    DirectoryStore, EloAggregator, GeneticAlgorithm, GeneticConfig, PointsAggregator,
    ScoreAggregator, TournamentConfig, TournamentFitness, WeightGene,
};
use hive_planner::{PlannerWeights, weights::WEIGHTS_COUNT};
use serde::{Deserialize, Serialize};

use super::judge::JudgeArg;
use crate::{
    model::PlannerModel,
    util::{self, Output},
};

/// Contents of the `--config` file; both sections are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct TrainConfig {
    genetic: GeneticConfig,
    tournament: TournamentConfig,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub(crate) enum AggregatorKind {
    #[default]
    Points,
    Elo,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Training config (JSON with optional `genetic` and `tournament` sections)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides `genetic.population_size`
    #[arg(long)]
    population_size: Option<usize>,
    /// Overrides `genetic.generations_max`
    #[arg(long)]
    generations: Option<u32>,
    /// Overrides `genetic.seed`
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides `tournament.rounds_per_generation`
    #[arg(long)]
    rounds: Option<usize>,
    /// Overrides `tournament.workers`
    #[arg(long)]
    workers: Option<usize>,
    /// Score aggregation: points or elo
    #[arg(long, default_value = "points")]
    aggregator: AggregatorKind,
    /// Seeds are read from and each generation's best is written to this directory
    #[arg(long, default_value = "chromosomes")]
    store_dir: PathBuf,
    /// Output file path for the trained model
    #[arg(long)]
    output: Option<PathBuf>,
    #[clap(flatten)]
    judge: JudgeArg,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let config = load_config(arg)?;
    let model = match arg.aggregator {
        AggregatorKind::Points => train(arg, config, PointsAggregator)?,
        AggregatorKind::Elo => train(arg, config, EloAggregator::default())?,
    };
    Output::save_json(&model, arg.output.clone())?;

    let path = arg
        .output
        .as_ref()
        .map_or_else(|| "stdout".to_owned(), |p| p.display().to_string());
    tracing::info!(
        %path,
        generation = model.generation,
        chromosome = %model.chromosome_id,
        final_fitness = model.final_fitness,
        "model saved"
    );
    Ok(())
}

fn load_config(arg: &TrainArg) -> anyhow::Result<TrainConfig> {
    let mut config = match &arg.config {
        Some(path) => util::read_json_file::<TrainConfig, _>("training config", path)?,
        None => TrainConfig::default(),
    };
    let genetic = &mut config.genetic;
    if genetic.chromosome_size != WEIGHTS_COUNT {
        tracing::warn!(
            configured = genetic.chromosome_size,
            used = WEIGHTS_COUNT,
            "chromosome_size is fixed by the planner weights"
        );
        genetic.chromosome_size = WEIGHTS_COUNT;
    }
    if let Some(size) = arg.population_size {
        genetic.population_size = size;
    }
    if let Some(generations) = arg.generations {
        genetic.generations_max = generations;
    }
    if arg.seed.is_some() {
        genetic.seed = arg.seed;
    }
    let tournament = &mut config.tournament;
    if let Some(rounds) = arg.rounds {
        tournament.rounds_per_generation = rounds;
    }
    if let Some(workers) = arg.workers {
        tournament.workers = workers.max(1);
    }
    Ok(config)
}

fn train<A>(arg: &TrainArg, config: TrainConfig, aggregator: A) -> anyhow::Result<PlannerModel>
where
    A: ScoreAggregator,
{
    let TrainConfig {
        genetic,
        tournament,
    } = config;
    tracing::info!(
        population = genetic.population_size,
        generations = genetic.generations_max,
        rounds = tournament.rounds_per_generation,
        workers = tournament.workers,
        judge = arg.judge.runner().program(),
        "training planner weights"
    );

    let store = DirectoryStore::new(&arg.store_dir, genetic.chromosome_size);
    let fitness = TournamentFitness::new(arg.judge.runner(), aggregator, tournament);
    let mut ga = GeneticAlgorithm::<WeightGene, _, _>::new(genetic, fitness, store);

    let mut last_report = None;
    let best = ga
        .run(|report, _| last_report = Some(report.clone()))
        .with_context(|| format!("Chromosome store failed: {}", arg.store_dir.display()))?;
    let report = last_report.context("No generation was evaluated")?;

    let weights = PlannerWeights::try_from(
        best.genes()
            .iter()
            .copied()
            .map(WeightGene::value)
            .collect::<Vec<_>>(),
    )?;
    Ok(PlannerModel::from_report(&report, weights))
}
