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

use super::material::Side;
use super::piece::PieceId;

/// One side's roster and the bookkeeping of its current turn.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct Player {
    side: Side,
    pieces: Vec<PieceId>,
    active: Option<PieceId>,
    initial_action: Option<PieceId>,
    removed_this_turn: Vec<PieceId>,
    removed: Vec<PieceId>,
}

impl Player {
    pub fn new(side: Side, pieces: Vec<PieceId>) -> Self {
        Self {
            side,
            pieces,
            active: None,
            initial_action: None,
            removed_this_turn: Vec::new(),
            removed: Vec::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }
    pub fn pieces(&self) -> &[PieceId] {
        &self.pieces
    }
    /// The piece currently selected.
    pub fn active(&self) -> Option<PieceId> {
        self.active
    }
    /// The piece that used part of its budget during the first action of
    /// the turn without finishing it.
    pub fn initial_action(&self) -> Option<PieceId> {
        self.initial_action
    }
    pub fn removed_this_turn(&self) -> &[PieceId] {
        &self.removed_this_turn
    }
    pub fn removed(&self) -> &[PieceId] {
        &self.removed
    }

    pub(crate) fn set_active(&mut self, id: Option<PieceId>) {
        self.active = id;
    }

    pub(crate) fn set_initial_action(&mut self, id: Option<PieceId>) {
        self.initial_action = id;
    }

    pub(crate) fn record_capture(&mut self, id: PieceId) {
        self.removed_this_turn.push(id);
    }

    /// Makes this turn's losses permanent and clears the selection.
    pub(crate) fn end_turn(&mut self) {
        self.removed.append(&mut self.removed_this_turn);
        self.active = None;
        self.initial_action = None;
    }
}
