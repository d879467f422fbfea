use std::path::{Path, PathBuf};

use hive_board::Board;
use hive_planner::{PlannerWeights, TurnState};

use crate::{
    model,
    util::{self, Output},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct PlanArg {
    /// Board snapshot (JSON)
    #[arg(long)]
    board: PathBuf,
    /// Planner model (JSON) or comma-separated weights file; built-in weights if omitted
    #[arg(long)]
    weights: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &PlanArg) -> anyhow::Result<()> {
    let PlanArg {
        board,
        weights,
        output,
    } = arg;
    let line = plan_line(board, weights.as_deref())?;
    Output::from_output_path(output.clone())?.write_line(&line)
}

fn plan_line(board: &Path, weights: Option<&Path>) -> anyhow::Result<String> {
    let board: Board = util::read_json_file("board", board)?;
    let weights = match weights {
        Some(path) => model::read_weights_file(path)?,
        None => PlannerWeights::default(),
    };
    tracing::debug!(
        cells = board.len(),
        bases = board.bases().len(),
        ants = board.total_my_ants(),
        "board loaded"
    );

    let state = TurnState::from_snapshot(board, weights);
    let plan = state.plan();
    tracing::info!(
        paths = plan.paths().len(),
        ants_used = plan.ants_used(),
        "planned"
    );
    Ok(plan.to_actions().to_string())
}
