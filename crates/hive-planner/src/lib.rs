//! Resource-weighted beacon planner.
//!
//! Once per turn the planner:
//!
//! 1. Resolves the [`weights::Factors`] for the current game state.
//! 2. Ranks every cell still holding crystals or eggs by [`scoring::priority`]
//!    of its best path from any owned base (ties keep cell index order).
//! 3. Greedily commits paths from the closest base to each ranked target with
//!    a [`BeaconAllocator`] limited by the ants available and the
//!    [`Factor::MaxPaths`] factor.
//! 4. Renders the committed beacons as an [`ActionList`].
//!
//! All shortest paths of a turn go through one [`PathCache`] that is dropped
//! when the turn ends, since step costs depend on the resources left.
//!
//! # Example
//!
//! ```
//! use hive_board::{Board, Cell, CellKind, CellUpdate};
//! use hive_planner::{PlannerWeights, TurnState};
//!
//! let cells = vec![
//!     Cell::new(CellKind::Empty, 0, [1]),
//!     Cell::new(CellKind::Empty, 0, [0, 2]),
//!     Cell::new(CellKind::Crystal, 30, [1]),
//! ];
//! let board = Board::new(cells, vec![0], vec![]).unwrap();
//! let mut state = TurnState::new(board, PlannerWeights::default());
//!
//! let actions = state.play_turn(&[
//!     CellUpdate { resources: 0, my_ants: 10, opp_ants: 0 },
//!     CellUpdate::default(),
//!     CellUpdate { resources: 30, my_ants: 0, opp_ants: 0 },
//! ]);
//! assert_eq!(actions.to_string(), "BEACON 0 1;BEACON 1 1;BEACON 2 1");
//! ```

use std::cmp::Ordering;

use hive_board::{Board, BoardError, CellIndex, CellKind, CellUpdate};
use serde::{Deserialize, Serialize};

pub use self::{
    action::{Action, ActionList, ParseActionError},
    allocator::{BeaconAllocator, BeaconPlan, Candidate},
    path_cache::PathCache,
    weights::{Factor, Factors, GameInputs, ParseWeightsError, PlannerWeights},
};

pub mod action;
pub mod allocator;
pub mod path_cache;
pub mod scoring;
pub mod weights;

/// Totals accumulated over every observed turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeTotals {
    pub crystals: u64,
    pub eggs: u64,
    pub turns: u32,
}

/// Planner state owned by the turn loop.
#[derive(Debug, Clone)]
pub struct TurnState {
    board: Board,
    weights: PlannerWeights,
    totals: CumulativeTotals,
}

impl TurnState {
    /// Starts a game on `board`. Nothing is counted until the first turn is applied.
    #[must_use]
    pub fn new(board: Board, weights: PlannerWeights) -> Self {
        Self {
            board,
            weights,
            totals: CumulativeTotals::default(),
        }
    }

    /// Starts from a board snapshot that already holds this turn's counts.
    #[must_use]
    pub fn from_snapshot(board: Board, weights: PlannerWeights) -> Self {
        let mut state = Self::new(board, weights);
        state.observe();
        state
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn totals(&self) -> CumulativeTotals {
        self.totals
    }

    /// Refreshes the board with this turn's counts.
    pub fn apply_turn(&mut self, updates: &[CellUpdate]) -> Result<(), BoardError> {
        self.board.apply_turn(updates)?;
        self.observe();
        Ok(())
    }

    /// Applies the turn and returns the actions to print.
    ///
    /// A turn that does not fit the board is logged and answered with `WAIT`,
    /// leaving the state untouched.
    pub fn play_turn(&mut self, updates: &[CellUpdate]) -> ActionList {
        if let Err(error) = self.apply_turn(updates) {
            tracing::warn!(%error, "turn input rejected, waiting");
            return ActionList::new();
        }
        self.plan().to_actions()
    }

    fn observe(&mut self) {
        self.totals.crystals += u64::from(self.board.total_resources(CellKind::Crystal));
        self.totals.eggs += u64::from(self.board.total_resources(CellKind::Egg));
        self.totals.turns += 1;
    }

    /// Game-state inputs for the current turn.
    #[must_use]
    pub fn inputs(&self) -> GameInputs {
        let board = &self.board;
        GameInputs {
            bases: board.bases().len(),
            crystal_cells: board.resource_cells(CellKind::Crystal).count(),
            egg_cells: board.resource_cells(CellKind::Egg).count(),
            total_crystals: self.totals.crystals,
            total_eggs: self.totals.eggs,
            total_resources: board.cells().iter().map(|c| u64::from(c.resources())).sum(),
            total_my_ants: u64::from(board.total_my_ants()),
        }
    }

    /// Plans beacons for the current turn.
    #[must_use]
    pub fn plan(&self) -> BeaconPlan {
        let board = &self.board;
        let factors = self.weights.resolve(&self.inputs());
        let mut cache = PathCache::new(board, &factors);

        let ranked = rank_targets(&mut cache, &factors);
        let allocator = BeaconAllocator::new(board.total_my_ants(), factors.max_paths());
        let plan = allocator.allocate(ranked.into_iter().map(|target| {
            let path = cache.closest_path(board.bases(), target);
            let strength =
                scoring::strength(&factors, board.cell(target).resources(), path.len());
            Candidate { path, strength }
        }));

        tracing::debug!(
            turn = self.totals.turns,
            paths = plan.paths().len(),
            beacons = plan.beacons().count(),
            ants_used = plan.ants_used(),
            "planned turn"
        );
        plan
    }
}

/// Resource cells ordered by their best priority over all bases.
fn rank_targets(cache: &mut PathCache<'_>, factors: &Factors) -> Vec<CellIndex> {
    let board = cache.board();
    let mut scored = board
        .cells()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.has_resources_of(CellKind::Crystal) || c.has_resources_of(CellKind::Egg))
        .map(|(target, _)| {
            let best = board
                .bases()
                .iter()
                .map(|&base| {
                    let path = cache.shortest_path(base, target);
                    scoring::priority(board, factors, &path)
                })
                .fold(f64::INFINITY, f64::min);
            (target, best)
        })
        .collect::<Vec<_>>();
    scored.sort_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(target, _)| target).collect()
}
