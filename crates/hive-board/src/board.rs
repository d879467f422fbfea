use serde::{Deserialize, Serialize};

use crate::{BoardError, Cell, CellIndex, CellKind, CellUpdate};

/// Serialized form of a [`Board`], validated on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BoardData {
    cells: Vec<Cell>,
    bases: Vec<CellIndex>,
    #[serde(default)]
    opp_bases: Vec<CellIndex>,
}

/// Cell graph with the bases of both players.
///
/// Neighbour adjacency is guaranteed symmetric and in range by every
/// constructor, including deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BoardData", into = "BoardData")]
pub struct Board {
    cells: Vec<Cell>,
    bases: Vec<CellIndex>,
    opp_bases: Vec<CellIndex>,
}

impl TryFrom<BoardData> for Board {
    type Error = BoardError;

    fn try_from(data: BoardData) -> Result<Self, Self::Error> {
        Self::new(data.cells, data.bases, data.opp_bases)
    }
}

impl From<Board> for BoardData {
    fn from(board: Board) -> Self {
        Self {
            cells: board.cells,
            bases: board.bases,
            opp_bases: board.opp_bases,
        }
    }
}

impl Board {
    /// Builds a board after checking the topology.
    pub fn new(
        cells: Vec<Cell>,
        bases: Vec<CellIndex>,
        opp_bases: Vec<CellIndex>,
    ) -> Result<Self, BoardError> {
        let len = cells.len();
        for (cell, c) in cells.iter().enumerate() {
            for &neighbor in c.neighbors() {
                if neighbor >= len {
                    return Err(BoardError::NeighborOutOfRange {
                        cell,
                        neighbor,
                        len,
                    });
                }
                if neighbor == cell {
                    return Err(BoardError::SelfNeighbor { cell });
                }
                if !cells[neighbor].neighbors().contains(&cell) {
                    return Err(BoardError::AsymmetricNeighbor { cell, neighbor });
                }
            }
        }
        if let Some(&base) = bases.iter().chain(&opp_bases).find(|&&b| b >= len) {
            return Err(BoardError::BaseOutOfRange { base, len });
        }
        Ok(Self {
            cells,
            bases,
            opp_bases,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Returns the cell at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn cell(&self, index: CellIndex) -> &Cell {
        &self.cells[index]
    }

    #[must_use]
    pub fn bases(&self) -> &[CellIndex] {
        &self.bases
    }

    #[must_use]
    pub fn opp_bases(&self) -> &[CellIndex] {
        &self.opp_bases
    }

    /// Refreshes resources and ant counts; `updates` is indexed by cell.
    pub fn apply_turn(&mut self, updates: &[CellUpdate]) -> Result<(), BoardError> {
        if updates.len() != self.cells.len() {
            return Err(BoardError::TurnLengthMismatch {
                expected: self.cells.len(),
                actual: updates.len(),
            });
        }
        for (cell, update) in self.cells.iter_mut().zip(updates) {
            cell.apply(*update);
        }
        Ok(())
    }

    /// Indices of cells of `kind` that still hold resources, in index order.
    pub fn resource_cells(&self, kind: CellKind) -> impl Iterator<Item = CellIndex> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.has_resources_of(kind))
            .map(|(i, _)| i)
    }

    #[must_use]
    pub fn total_resources(&self, kind: CellKind) -> u32 {
        self.cells
            .iter()
            .filter(|c| c.kind() == kind)
            .map(Cell::resources)
            .sum()
    }

    #[must_use]
    pub fn total_my_ants(&self) -> u32 {
        self.cells.iter().map(Cell::my_ants).sum()
    }

    #[must_use]
    pub fn total_opp_ants(&self) -> u32 {
        self.cells.iter().map(Cell::opp_ants).sum()
    }
}
