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

use serde::{Deserialize, Serialize};
use std::ops::Index;

use super::material::{Kind, Side};
use super::moves::attackable_tiles;
use super::position::Position;
use super::square::{Square, CELLS};

/// How many pieces of each side could strike a cell.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ThreatLevel {
    pub challenger: u8,
    pub opposition: u8,
}

impl ThreatLevel {
    pub fn of(&self, side: Side) -> u8 {
        match side {
            Side::Challenger => self.challenger,
            Side::Opposition => self.opposition,
        }
    }

    pub fn total(&self) -> u8 {
        self.challenger + self.opposition
    }

    /// Share of the threat held by `side`, or `None` for an unthreatened cell.
    pub fn ratio(&self, side: Side) -> Option<f32> {
        match self.total() {
            0 => None,
            total => Some(self.of(side) as f32 / total as f32),
        }
    }

    fn add(&mut self, side: Side) {
        match side {
            Side::Challenger => self.challenger += 1,
            Side::Opposition => self.opposition += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreatMap([ThreatLevel; CELLS]);

impl ThreatMap {
    /// Counts, for every cell, the pieces of each side able to attack it.
    /// Each piece is evaluated with the full budgets of its stance so the
    /// side that is not moving still shows its reach. Cannons are left out.
    pub fn compute(pos: &Position) -> Self {
        let mut levels = [ThreatLevel::default(); CELLS];
        for piece in pos.pieces() {
            if piece.square().is_none() || piece.kind() == Kind::Cannon {
                continue;
            }
            let piece = piece.refreshed();
            for square in attackable_tiles(pos, &piece) {
                levels[square].add(piece.side());
            }
        }
        Self(levels)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Square, &ThreatLevel)> {
        self.0
            .iter()
            .enumerate()
            .map(|(index, level)| (Square::from_index(index), level))
    }
}

impl Index<Square> for ThreatMap {
    type Output = ThreatLevel;
    fn index(&self, square: Square) -> &Self::Output {
        &self.0[square]
    }
}
