// Copyright 2023 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

use anyhow::Result;
use once_cell::sync::Lazy;
#[cfg(feature = "random")]
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum_macros::{Display, EnumIter};
use thiserror::Error;

use super::material::{Kind, Pair, Side};
use super::square::{Mask, Square, CELLS};

use Kind::{Archer, Cannon, General, Soldier};

#[derive(Error, Debug, Serialize, Deserialize)]
pub enum LayoutError {
    #[error("Cell index is out of range (expecting 0..81)")]
    OutOfRange,
    #[error("Two pieces placed on the same cell")]
    Occupied,
    #[error("Expecting exactly 1 general and 1 cannon")]
    Roster,
    #[error("Layouts of both sides share a cell")]
    Overlap,
}

use LayoutError::*;

/// The two starting arrangements each side may pick from.
#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Default)]
pub enum Formation {
    #[default]
    Attack,
    Defense,
}

impl Formation {
    #[cfg(feature = "random")]
    pub fn random() -> Self {
        if thread_rng().gen_bool(0.5) {
            Formation::Attack
        } else {
            Formation::Defense
        }
    }

    const fn to_index(self) -> usize {
        self as usize
    }
}

/// Starting placement of one side's pieces. Placement order fixes the
/// order in which piece ids are handed out.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct Layout {
    placements: Vec<(Square, Kind)>,
}

impl Layout {
    pub fn lookup(side: Side, formation: Formation) -> &'static Layout {
        &LAYOUTS[side][formation.to_index()]
    }

    /// Builds a custom layout from `(cell index, kind)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if a cell index is out of range, if two pieces share
    /// a cell or if the layout does not hold exactly one general and one
    /// cannon.
    pub fn build<I>(placements: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, Kind)>,
    {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for (index, kind) in placements {
            if index >= CELLS {
                return Err(OutOfRange.into());
            }
            if !seen.insert(index) {
                return Err(Occupied.into());
            }
            result.push((Square::from_index(index), kind));
        }
        let count = |kind: Kind| result.iter().filter(|(_, k)| *k == kind).count();
        if count(General) != 1 || count(Cannon) != 1 {
            return Err(Roster.into());
        }
        Ok(Self { placements: result })
    }

    pub fn placements(&self) -> &[(Square, Kind)] {
        &self.placements
    }

    pub fn squares(&self) -> Mask {
        Mask::from_squares(self.placements.iter().map(|(square, _)| *square))
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

#[cfg(test)]
impl Layout {
    pub(crate) fn empty() -> Self {
        Self {
            placements: Vec::new(),
        }
    }
}

/// Verifies that two layouts can share a board.
///
/// # Errors
///
/// Returns `LayoutError::Overlap` if any cell is claimed by both.
pub fn check_overlap(challenger: &Layout, opposition: &Layout) -> Result<()> {
    if !(challenger.squares() & opposition.squares()).is_empty() {
        return Err(Overlap.into());
    }
    Ok(())
}

fn table(entries: &[(usize, Kind)]) -> Layout {
    Layout {
        placements: entries
            .iter()
            .map(|(index, kind)| (Square::from_index(*index), *kind))
            .collect(),
    }
}

static LAYOUTS: Lazy<Pair<[Layout; 2]>> = Lazy::new(|| {
    const CHALLENGER_ATTACK: [(usize, Kind); 7] = [
        (18, Archer), (28, Soldier), (38, Archer), (37, Cannon),
        (36, General), (46, Soldier), (54, Archer),
    ];
    const CHALLENGER_DEFENSE: [(usize, Kind); 7] = [
        (29, Archer), (28, Soldier), (38, Archer), (37, Cannon),
        (36, General), (47, Archer), (46, Soldier),
    ];
    const OPPOSITION_ATTACK: [(usize, Kind); 7] = [
        (26, Archer), (34, Soldier), (42, Archer), (43, Cannon),
        (44, General), (52, Soldier), (62, Archer),
    ];
    const OPPOSITION_DEFENSE: [(usize, Kind); 7] = [
        (33, Archer), (34, Soldier), (42, Archer), (43, Cannon),
        (44, General), (51, Archer), (52, Soldier),
    ];
    Pair::new(
        [table(&CHALLENGER_ATTACK), table(&CHALLENGER_DEFENSE)],
        [table(&OPPOSITION_ATTACK), table(&OPPOSITION_DEFENSE)],
    )
});
