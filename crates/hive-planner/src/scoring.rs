use hive_board::{Board, Cell, CellIndex, CellKind};

use crate::weights::{Factor, Factors, clamp};

/// Beacon strength bounds.
pub const MIN_STRENGTH: u32 = 1;
pub const MAX_STRENGTH: u32 = 100;

/// Resources of `kind` held by the cells of `path`.
#[must_use]
pub fn path_resources(board: &Board, path: &[CellIndex], kind: CellKind) -> u32 {
    path.iter()
        .map(|&c| board.cell(c))
        .filter(|c| c.kind() == kind)
        .map(Cell::resources)
        .sum()
}

/// Ranking key of a target reached through `path`; lower is picked first.
///
/// Unreachable targets (empty path) rank last with `+inf`.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn priority(board: &Board, factors: &Factors, path: &[CellIndex]) -> f64 {
    if path.is_empty() {
        return f64::INFINITY;
    }
    let eggs = f64::from(path_resources(board, path, CellKind::Egg));
    let crystals = f64::from(path_resources(board, path, CellKind::Crystal));
    let value =
        factors.get(Factor::EggPriority) * eggs + factors.get(Factor::CrystalPriority) * crystals;
    -value / (path.len() as f64).powf(factors.get(Factor::PathLengthExponent))
}

/// Beacon strength for a target holding `resources`, `distance` cells away from its base.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn strength(factors: &Factors, resources: u32, distance: usize) -> u32 {
    let distance = f64::from(u32::try_from(distance).unwrap_or(u32::MAX));
    let raw = factors.get(Factor::StrengthScale)
        * f64::from(resources)
        * distance.powf(factors.get(Factor::StrengthDistanceExponent));
    let value = clamp(raw, f64::from(MIN_STRENGTH), f64::from(MAX_STRENGTH)).ceil();
    value as u32
}
