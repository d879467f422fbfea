use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::{BoardError, CellIndex};

/// Maximum number of neighbours of a hexagonal cell.
pub const MAX_NEIGHBORS: usize = 6;

/// What a cell holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellKind {
    Empty,
    Egg,
    Crystal,
}

impl CellKind {
    /// Decodes the integer code used by the game protocol (`0`, `1`, `2`).
    pub fn from_code(code: i64) -> Result<Self, BoardError> {
        match code {
            0 => Ok(Self::Empty),
            1 => Ok(Self::Egg),
            2 => Ok(Self::Crystal),
            _ => Err(BoardError::UnknownCellKind { code }),
        }
    }
}

/// Per-turn refresh of a single cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellUpdate {
    pub resources: u32,
    pub my_ants: u32,
    pub opp_ants: u32,
}

/// A single board cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    kind: CellKind,
    resources: u32,
    neighbors: ArrayVec<CellIndex, MAX_NEIGHBORS>,
    #[serde(default)]
    my_ants: u32,
    #[serde(default)]
    opp_ants: u32,
}

impl Cell {
    /// Creates a cell with no ants on it.
    ///
    /// # Panics
    ///
    /// Panics if more than [`MAX_NEIGHBORS`] neighbours are given.
    pub fn new<I>(kind: CellKind, resources: u32, neighbors: I) -> Self
    where
        I: IntoIterator<Item = CellIndex>,
    {
        Self {
            kind,
            resources,
            neighbors: neighbors.into_iter().collect(),
            my_ants: 0,
            opp_ants: 0,
        }
    }

    /// Creates a cell from the raw protocol neighbour list, where `-1` marks a missing neighbour.
    #[must_use]
    pub fn from_raw_neighbors(kind: CellKind, resources: u32, raw: [i64; MAX_NEIGHBORS]) -> Self {
        Self::new(
            kind,
            resources,
            raw.into_iter()
                .filter_map(|n| CellIndex::try_from(n).ok()),
        )
    }

    #[must_use]
    pub fn kind(&self) -> CellKind {
        self.kind
    }

    #[must_use]
    pub fn resources(&self) -> u32 {
        self.resources
    }

    /// Returns `true` if the cell is of `kind` and still holds resources.
    #[must_use]
    pub fn has_resources_of(&self, kind: CellKind) -> bool {
        self.kind == kind && self.resources > 0
    }

    #[must_use]
    pub fn neighbors(&self) -> &[CellIndex] {
        &self.neighbors
    }

    #[must_use]
    pub fn my_ants(&self) -> u32 {
        self.my_ants
    }

    #[must_use]
    pub fn opp_ants(&self) -> u32 {
        self.opp_ants
    }

    pub(crate) fn apply(&mut self, update: CellUpdate) {
        self.resources = update.resources;
        self.my_ants = update.my_ants;
        self.opp_ants = update.opp_ants;
    }
}
