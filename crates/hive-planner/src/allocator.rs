use std::collections::BTreeMap;

use hive_board::CellIndex;
use serde::Serialize;

use crate::action::{Action, ActionList};

/// A ranked target together with the path leading to it from its closest base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: Vec<CellIndex>,
    pub strength: u32,
}

/// Beacons committed for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BeaconPlan {
    beacons: BTreeMap<CellIndex, u32>,
    paths: Vec<Vec<CellIndex>>,
    ants_used: u32,
}

impl BeaconPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.beacons.is_empty()
    }

    /// Strength of the beacon on `cell`, if any.
    #[must_use]
    pub fn strength(&self, cell: CellIndex) -> Option<u32> {
        self.beacons.get(&cell).copied()
    }

    /// Beacons in cell index order.
    pub fn beacons(&self) -> impl Iterator<Item = (CellIndex, u32)> + '_ {
        self.beacons.iter().map(|(&c, &s)| (c, s))
    }

    #[must_use]
    pub fn paths(&self) -> &[Vec<CellIndex>] {
        &self.paths
    }

    /// Sum of the marginal path lengths committed.
    #[must_use]
    pub fn ants_used(&self) -> u32 {
        self.ants_used
    }

    /// Converts the plan into `BEACON` actions.
    #[must_use]
    pub fn to_actions(&self) -> ActionList {
        self.beacons()
            .map(|(cell, strength)| Action::Beacon { cell, strength })
            .collect()
    }

    fn marginal_len(&self, path: &[CellIndex]) -> usize {
        path.iter().filter(|c| !self.beacons.contains_key(c)).count()
    }

    fn commit(&mut self, path: Vec<CellIndex>, strength: u32, marginal: u32) {
        for &cell in &path {
            let slot = self.beacons.entry(cell).or_default();
            *slot = (*slot).max(strength);
        }
        self.paths.push(path);
        self.ants_used += marginal;
    }
}

/// Greedy allocation of a unit budget over ranked paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconAllocator {
    budget: u32,
    max_paths: usize,
}

impl BeaconAllocator {
    #[must_use]
    pub fn new(budget: u32, max_paths: usize) -> Self {
        Self { budget, max_paths }
    }

    /// Walks `candidates` in order and commits each one the remaining budget
    /// can cover.
    ///
    /// Only the cells not already carrying a beacon are charged. Unreachable
    /// candidates (empty path) and candidates the budget cannot cover are
    /// skipped. Stops after `max_paths` commits. `candidates` is consumed
    /// lazily, so expensive path lookups past the cut-off are never made.
    pub fn allocate<I>(&self, candidates: I) -> BeaconPlan
    where
        I: IntoIterator<Item = Candidate>,
    {
        let mut plan = BeaconPlan::default();
        let mut remaining = self.budget;
        for Candidate { path, strength } in candidates {
            if plan.paths.len() >= self.max_paths {
                break;
            }
            if path.is_empty() {
                continue;
            }
            let Ok(marginal) = u32::try_from(plan.marginal_len(&path)) else {
                continue;
            };
            if remaining < marginal {
                continue;
            }
            remaining -= marginal;
            plan.commit(path, strength, marginal);
        }
        plan
    }
}
