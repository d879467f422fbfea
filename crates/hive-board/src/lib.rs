//! Board model for hexagonal resource-gathering games.
//!
//! The board is an arena of [`Cell`]s addressed by integer index. Each cell knows
//! its kind (empty, egg, crystal), how many resources it still holds, up to six
//! neighbour indices and how many ants of each player stand on it.
//!
//! Topology is fixed once the board is built; resource and ant counts are
//! refreshed every turn through [`Board::apply_turn`].
//!
//! # Example
//!
//! ```
//! use hive_board::{Board, Cell, CellKind, CellUpdate};
//!
//! // 0 - 1 - 2
//! let cells = vec![
//!     Cell::new(CellKind::Empty, 0, [1]),
//!     Cell::new(CellKind::Crystal, 10, [0, 2]),
//!     Cell::new(CellKind::Egg, 4, [1]),
//! ];
//! let mut board = Board::new(cells, vec![0], vec![2]).unwrap();
//!
//! board
//!     .apply_turn(&[
//!         CellUpdate { resources: 0, my_ants: 5, opp_ants: 0 },
//!         CellUpdate { resources: 8, my_ants: 0, opp_ants: 0 },
//!         CellUpdate { resources: 4, my_ants: 0, opp_ants: 3 },
//!     ])
//!     .unwrap();
//!
//! assert_eq!(board.total_my_ants(), 5);
//! assert_eq!(board.total_resources(CellKind::Crystal), 8);
//! ```

pub use self::{board::*, cell::*};

mod board;
mod cell;

/// Index of a cell inside a [`Board`].
pub type CellIndex = usize;

/// Errors raised while building or refreshing a [`Board`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum BoardError {
    #[display("cell {cell} lists neighbour {neighbor}, which is out of range (board has {len} cells)")]
    NeighborOutOfRange {
        cell: CellIndex,
        neighbor: CellIndex,
        len: usize,
    },
    #[display("cell {cell} lists neighbour {neighbor}, but {neighbor} does not list {cell}")]
    AsymmetricNeighbor { cell: CellIndex, neighbor: CellIndex },
    #[display("cell {cell} lists itself as a neighbour")]
    SelfNeighbor { cell: CellIndex },
    #[display("base {base} is out of range (board has {len} cells)")]
    BaseOutOfRange { base: CellIndex, len: usize },
    #[display("turn update has {actual} cells, expected {expected}")]
    TurnLengthMismatch { expected: usize, actual: usize },
    #[display("unknown cell kind code {code}")]
    UnknownCellKind { code: i64 },
}
