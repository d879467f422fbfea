//! Resource-discounted shortest paths.
//!
//! Entering a cell costs 1, minus a discount for the resources it holds. The
//! discount is clamped to `[0, 0.99]`, so every step keeps a strictly positive
//! cost and Dijkstra stays well defined. A full path tree is computed per
//! source on first use and kept until the cache is dropped at the end of the
//! turn.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap},
};

use hive_board::{Board, Cell, CellIndex, CellKind};

use crate::weights::{Factor, Factors, clamp};

/// Largest fraction of the base step cost a resource can discount.
pub const MAX_DISCOUNT: f64 = 0.99;

/// Cost of entering `cell` for this turn.
#[must_use]
pub fn step_cost(cell: &Cell, factors: &Factors) -> f64 {
    let (numerator, divisor_a, divisor_b) = match cell.kind() {
        CellKind::Crystal => (
            Factor::CrystalDiscount,
            Factor::CrystalDiscountDivisorA,
            Factor::CrystalDiscountDivisorB,
        ),
        CellKind::Egg => (
            Factor::EggDiscount,
            Factor::EggDiscountDivisorA,
            Factor::EggDiscountDivisorB,
        ),
        CellKind::Empty => return 1.0,
    };
    if cell.resources() == 0 {
        return 1.0;
    }
    let discount = f64::from(cell.resources()) * factors.get(numerator)
        / factors.get(divisor_a)
        / factors.get(divisor_b);
    1.0 - clamp(discount, 0.0, MAX_DISCOUNT)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Visit {
    distance: f64,
    cell: CellIndex,
}

impl Eq for Visit {}

impl Ord for Visit {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap on distance, then lower index first
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

impl PartialOrd for Visit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest-path tree rooted at one source.
#[derive(Debug, Clone)]
struct PathTree {
    distance: Vec<f64>,
    previous: Vec<Option<CellIndex>>,
}

impl PathTree {
    fn build(board: &Board, costs: &[f64], start: CellIndex) -> Self {
        let mut distance = vec![f64::INFINITY; board.len()];
        let mut previous = vec![None; board.len()];
        let mut queue = BinaryHeap::new();

        distance[start] = 0.0;
        queue.push(Visit {
            distance: 0.0,
            cell: start,
        });

        while let Some(Visit { distance: d, cell }) = queue.pop() {
            if d > distance[cell] {
                continue;
            }
            for &neighbor in board.cell(cell).neighbors() {
                let candidate = d + costs[neighbor];
                if candidate < distance[neighbor] {
                    distance[neighbor] = candidate;
                    previous[neighbor] = Some(cell);
                    queue.push(Visit {
                        distance: candidate,
                        cell: neighbor,
                    });
                }
            }
        }

        Self { distance, previous }
    }

    fn path_to(&self, end: CellIndex) -> Vec<CellIndex> {
        if !self.distance[end].is_finite() {
            return vec![];
        }
        let mut path = vec![end];
        let mut cell = end;
        while let Some(prev) = self.previous[cell] {
            path.push(prev);
            cell = prev;
        }
        path.reverse();
        path
    }
}

/// Per-turn memo of shortest paths, keyed by source cell.
#[derive(Debug)]
pub struct PathCache<'a> {
    board: &'a Board,
    costs: Vec<f64>,
    trees: HashMap<CellIndex, PathTree>,
}

impl<'a> PathCache<'a> {
    /// Cache with step costs derived from this turn's resources.
    #[must_use]
    pub fn new(board: &'a Board, factors: &Factors) -> Self {
        let costs = board.cells().iter().map(|c| step_cost(c, factors)).collect();
        Self::with_costs(board, costs)
    }

    /// Cache with explicit per-cell step costs.
    ///
    /// # Panics
    ///
    /// Panics if `costs` does not have one entry per cell.
    #[must_use]
    pub fn with_costs(board: &'a Board, costs: Vec<f64>) -> Self {
        assert_eq!(costs.len(), board.len(), "one step cost per cell");
        Self {
            board,
            costs,
            trees: HashMap::new(),
        }
    }

    #[must_use]
    pub fn board(&self) -> &'a Board {
        self.board
    }

    /// Shortest path from `start` to `end`, both ends included.
    ///
    /// Returns an empty path when `end` is unreachable.
    pub fn shortest_path(&mut self, start: CellIndex, end: CellIndex) -> Vec<CellIndex> {
        let board = self.board;
        let costs = &self.costs;
        self.trees
            .entry(start)
            .or_insert_with(|| PathTree::build(board, costs, start))
            .path_to(end)
    }

    /// Shortest path to `end` from the nearest of `sources` (by number of cells).
    ///
    /// Unreachable sources are ignored; ties keep the first source.
    pub fn closest_path(&mut self, sources: &[CellIndex], end: CellIndex) -> Vec<CellIndex> {
        let mut best: Vec<CellIndex> = vec![];
        for &source in sources {
            let path = self.shortest_path(source, end);
            if !path.is_empty() && (best.is_empty() || path.len() < best.len()) {
                best = path;
            }
        }
        best
    }

    /// Number of source trees computed so far.
    #[must_use]
    pub fn cached_sources(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use hive_board::CellUpdate;

    use super::*;
    use crate::weights::{GameInputs, PlannerWeights};

    fn board(cells: Vec<Cell>) -> Board {
        Board::new(cells, vec![0], vec![]).unwrap()
    }

    fn uniform(board: &Board) -> PathCache<'_> {
        PathCache::with_costs(board, vec![1.0; board.len()])
    }

    #[test]
    fn test_linear_graph() {
        let board = board(vec![
            Cell::new(CellKind::Empty, 0, [1]),
            Cell::new(CellKind::Empty, 0, [0, 2]),
            Cell::new(CellKind::Empty, 0, [1, 3]),
            Cell::new(CellKind::Empty, 0, [2]),
        ]);
        let mut cache = uniform(&board);
        assert_eq!(cache.shortest_path(0, 3), [0, 1, 2, 3]);
        assert_eq!(cache.shortest_path(0, 0), [0]);
        assert_eq!(cache.shortest_path(3, 1), [3, 2, 1]);
    }

    #[test]
    fn test_disconnected_graph() {
        let board = board(vec![
            Cell::new(CellKind::Empty, 0, [1]),
            Cell::new(CellKind::Empty, 0, [0]),
            Cell::new(CellKind::Empty, 0, [3]),
            Cell::new(CellKind::Empty, 0, [2]),
        ]);
        let mut cache = uniform(&board);
        assert!(cache.shortest_path(0, 3).is_empty());
        assert_eq!(cache.shortest_path(0, 1), [0, 1]);
    }

    #[test]
    fn test_memoized_per_source() {
        let board = board(vec![
            Cell::new(CellKind::Empty, 0, [1]),
            Cell::new(CellKind::Empty, 0, [0]),
        ]);
        let mut cache = uniform(&board);
        cache.shortest_path(0, 1);
        cache.shortest_path(0, 0);
        assert_eq!(cache.cached_sources(), 1);
        cache.shortest_path(1, 0);
        assert_eq!(cache.cached_sources(), 2);
    }

    #[test]
    fn test_resources_bend_the_path() {
        //     1
        //   /   \
        // 0       3
        //   \   /
        //     2 (crystal)
        let mut board = board(vec![
            Cell::new(CellKind::Empty, 0, [1, 2]),
            Cell::new(CellKind::Empty, 0, [0, 3]),
            Cell::new(CellKind::Crystal, 20, [0, 3]),
            Cell::new(CellKind::Empty, 0, [1, 2]),
        ]);
        board
            .apply_turn(&[
                CellUpdate {
                    resources: 0,
                    my_ants: 10,
                    opp_ants: 0,
                },
                CellUpdate::default(),
                CellUpdate {
                    resources: 20,
                    my_ants: 0,
                    opp_ants: 0,
                },
                CellUpdate::default(),
            ])
            .unwrap();
        let inputs = GameInputs {
            bases: 1,
            crystal_cells: 1,
            total_resources: 20,
            total_my_ants: 10,
            ..GameInputs::default()
        };
        let factors = PlannerWeights::default().resolve(&inputs);
        let cost = step_cost(board.cell(2), &factors);
        assert!(cost < 1.0 && cost > 0.0);

        let mut cache = PathCache::new(&board, &factors);
        assert_eq!(cache.shortest_path(0, 3), [0, 2, 3]);

        // without resources the lower index wins the tie
        let mut flat = uniform(&board);
        assert_eq!(flat.shortest_path(0, 3), [0, 1, 3]);
    }

    #[test]
    fn test_discount_is_capped() {
        let cell = Cell::new(CellKind::Egg, 1_000_000, []);
        let inputs = GameInputs {
            total_resources: 1,
            total_my_ants: 1,
            ..GameInputs::default()
        };
        let factors = PlannerWeights::default().resolve(&inputs);
        let cost = step_cost(&cell, &factors);
        assert!((cost - (1.0 - MAX_DISCOUNT)).abs() < 1e-12);
    }

    #[test]
    fn test_closest_path() {
        // 0 - 1 - 2 - 3 - 4, plus isolated 5
        let cells = vec![
            Cell::new(CellKind::Empty, 0, [1]),
            Cell::new(CellKind::Empty, 0, [0, 2]),
            Cell::new(CellKind::Empty, 0, [1, 3]),
            Cell::new(CellKind::Empty, 0, [2, 4]),
            Cell::new(CellKind::Empty, 0, [3]),
            Cell::new(CellKind::Empty, 0, []),
        ];
        let board = Board::new(cells, vec![0, 4, 5], vec![]).unwrap();
        let mut cache = uniform(&board);
        assert_eq!(cache.closest_path(board.bases(), 3), [4, 3]);
        assert_eq!(cache.closest_path(&[5, 0], 1), [0, 1]);
        assert!(cache.closest_path(&[5], 1).is_empty());
    }
}
