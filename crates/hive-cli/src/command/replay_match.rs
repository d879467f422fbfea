use std::path::{Path, PathBuf};

use anyhow::Context;
use hive_genetic::{
    Chromosome, Gene, MatchOutcome, MatchRunner, SynapseGene, ThrustGene, WeightGene,
};

use super::judge::JudgeArg;
use crate::util::{self, Output};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub(crate) enum GeneKind {
    /// Real-valued weights (planner weights)
    #[default]
    Weight,
    /// Quantized synapse weights, one character per gene
    Synapse,
    /// `rotate power` pairs
    Thrust,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ReplayMatchArg {
    /// First player's chromosome file (`{generation:05}_{id}.txt`)
    first: PathBuf,
    /// Second player's chromosome file
    second: PathBuf,
    /// Gene type stored in the files: weight, synapse or thrust
    #[arg(long, default_value = "weight")]
    gene: GeneKind,
    #[clap(flatten)]
    judge: JudgeArg,
}

pub(crate) fn run(arg: &ReplayMatchArg) -> anyhow::Result<()> {
    let outcome = match arg.gene {
        GeneKind::Weight => replay::<WeightGene>(arg)?,
        GeneKind::Synapse => replay::<SynapseGene>(arg)?,
        GeneKind::Thrust => replay::<ThrustGene>(arg)?,
    };
    Output::save_json(&outcome, None)
}

fn replay<G>(arg: &ReplayMatchArg) -> anyhow::Result<MatchOutcome>
where
    G: Gene,
{
    let first = read_chromosome::<G>(&arg.first)?;
    let second = read_chromosome::<G>(&arg.second)?;
    let runner = arg.judge.runner();
    tracing::info!(
        first = %first.id(),
        second = %second.id(),
        judge = runner.program(),
        "replaying match"
    );
    let outcome = runner
        .run_match(&first, &second)
        .with_context(|| format!("Match failed: {} vs {}", first.id(), second.id()))?;
    tracing::info!(scores = ?outcome.scores, rounds = ?outcome.rounds, "match finished");
    Ok(outcome)
}

pub(crate) fn read_chromosome<G>(path: &Path) -> anyhow::Result<Chromosome<G>>
where
    G: Gene,
{
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let (generation, id) = Chromosome::<G>::parse_file_name(name).with_context(|| {
        format!(
            "Expected a `<generation>_<id>.txt` chromosome file: {}",
            path.display()
        )
    })?;
    let text = util::read_text_file("chromosome", path)?;
    Chromosome::decode(id, generation, &text)
        .with_context(|| format!("Failed to decode chromosome file: {}", path.display()))
}
