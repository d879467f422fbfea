use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use hive_genetic::{ChromosomeId, GenerationReport};
use hive_planner::PlannerWeights;
use serde::{Deserialize, Serialize};

use crate::util;

/// Trained planner weights as written by `hive train`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerModel {
    pub trained_at: DateTime<Utc>,
    pub generation: u32,
    pub chromosome_id: ChromosomeId,
    pub final_fitness: f64,
    pub weights: PlannerWeights,
}

impl PlannerModel {
    pub fn from_report(report: &GenerationReport, weights: PlannerWeights) -> Self {
        Self {
            trained_at: Utc::now(),
            generation: report.generation,
            chromosome_id: report.best_id,
            final_fitness: report.best_score,
            weights,
        }
    }
}

/// Reads planner weights from a model JSON file or from a chromosome file
/// holding the comma-separated encoding.
pub fn read_weights_file<P>(path: P) -> anyhow::Result<PlannerWeights>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.extension().is_some_and(|ext| ext == "json") {
        let model: PlannerModel = util::read_json_file("planner model", path)?;
        return Ok(model.weights);
    }
    util::read_text_file("weights", path)?
        .parse()
        .with_context(|| format!("Failed to parse weights file: {}", path.display()))
}
