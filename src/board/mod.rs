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

//! Rules engine for a two-sided tactics game on a 9-by-9 grid
//!
//! A _match_ pits the `Challenger` against the `Opposition`. Each side
//! fields archers, soldiers, a cannon and a general, and spends two
//! actions per turn moving and attacking with them. The following
//! features are supported:
//!
//! [x] Attack and Defense starting formations for both sides
//! [x] Custom starting layouts
//! [x] Two actions per turn, with a partially used first action
//! [x] Archer shadows cast by defending soldiers
//! [x] Interception of attacks by defending soldiers
//! [x] Cannons that need two adjacent friendlies to ready, move or fire
//! [x] Threat map of the cells each side can attack
//! [x] Undo back to the start of the current turn
//! [x] Surrender
//! [ ] Time controls
//! [ ] Replaying a match from a recorded list of actions
//!
//! Some of the key abstractions include:
//!
//! * A `Square` is a single cell on the 9-by-9 board, addressed by
//!   column and row (both `0..9`) or by its row-major index (`0..81`).
//!   Squares are built from outside input with `Square::try_new` or
//!   `Square::try_from_index`, which reject off-board values.
//!
//! * A `Mask` is a 128-bit (u128) value in which the low 81 bits map to
//!   cells on the board. Masks are how legal destinations, attack
//!   targets and occupied cells are returned. They can be combined with
//!   the bitwise `|`, `|=`, `&`, `&=` and `!` operators and `iter()`
//!   yields the cells in ascending index order.
//!
//! * A `Piece` belongs to a `Side` and carries a `Variant`: `Archer`,
//!   `Soldier` (with a `Stance`), `Cannon` (with a `Readiness`) or
//!   `General`. Every piece holds a movement and an attack budget that
//!   is refilled at the start of its side's turn.
//!
//! * A `Position` holds the cell contents and every piece ever placed,
//!   captured pieces included. Pieces are addressed by `PieceId`, which
//!   stays valid for the lifetime of the match.
//!
//! * `PlayState` enforces the turn and action rules. Every public
//!   mutating operation either succeeds or leaves the state exactly as
//!   it was. `Match` is the public face of a `PlayState`.
//!

use anyhow::Result;

mod layout;
mod material;
mod moves;
mod piece;
mod play;
mod player;
mod position;
mod reach;
mod square;
mod threat;

pub use layout::*;
pub use material::*;
pub use moves::*;
pub use piece::*;
pub use play::*;
pub use player::*;
pub use position::*;
pub use reach::*;
pub use square::*;
pub use threat::*;

use crate::game::MatchResult;

pub trait Turn {
    fn turn(&self) -> Side;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    state: PlayState,
}

impl Match {
    pub fn new(formations: Pair<Formation>) -> Self {
        Self {
            state: PlayState::new(formations),
        }
    }
    pub fn standard() -> Self {
        Self::new(Pair::default())
    }
    #[cfg(feature = "random")]
    pub fn shuffled() -> Self {
        Self::new(Pair::new(Formation::random(), Formation::random()))
    }
    pub fn from_layouts(challenger: &Layout, opposition: &Layout) -> Result<Self> {
        Ok(Self {
            state: PlayState::from_layouts(challenger, opposition)?,
        })
    }

    pub fn select_piece(&mut self, id: PieceId) -> Result<Option<MatchEvent>> {
        self.state.select_piece(id)
    }
    pub fn choose_move(&mut self) -> Result<Mask> {
        self.state.choose_move()
    }
    pub fn choose_attack(&mut self) -> Result<Mask> {
        self.state.choose_attack()
    }
    pub fn ready_cannon(&mut self) -> Result<Mask> {
        self.state.ready_cannon()
    }
    pub fn switch_stance(&mut self) -> Result<()> {
        self.state.switch_stance()
    }
    pub fn resolve_selection(&mut self, square: Square) -> Result<MatchEvent> {
        self.state.resolve_selection(square)
    }
    pub fn apply_move(&mut self, id: PieceId, square: Square) -> Result<MatchEvent> {
        self.state.apply_move(id, square)
    }
    pub fn apply_attack(&mut self, id: PieceId, square: Square) -> Result<MatchEvent> {
        self.state.apply_attack(id, square)
    }
    pub fn cancel(&mut self) -> Result<()> {
        self.state.cancel()
    }
    pub fn end_action(&mut self) -> Result<()> {
        self.state.end_action()
    }
    pub fn end_turn(&mut self) -> Result<Option<MatchResult>> {
        self.state.end_turn()
    }
    pub fn undo_turn(&mut self) -> Result<()> {
        self.state.undo_turn()
    }
    pub fn surrender(&mut self) -> Result<MatchResult> {
        self.state.surrender()
    }
    pub fn reset_match(&mut self) {
        self.state.reset_match()
    }

    pub fn piece_id(&self, index: usize) -> Result<PieceId> {
        self.state.piece_id(index)
    }
    pub fn legal_move_tiles(&self, id: PieceId) -> Result<Mask> {
        self.state.legal_move_tiles(id)
    }
    pub fn legal_attack_tiles(&self, id: PieceId) -> Result<Mask> {
        self.state.legal_attack_tiles(id)
    }
    pub fn threat_tiles(&self, id: PieceId) -> Result<Mask> {
        self.state.threat_tiles(id)
    }
    pub fn threat_map(&self) -> &ThreatMap {
        self.state.threat_map()
    }

    #[inline]
    pub fn actions_remaining(&self) -> u8 {
        self.state.actions_remaining()
    }
    #[inline]
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }
    pub fn active_piece(&self) -> Option<PieceId> {
        self.state.active_piece()
    }
    pub fn player(&self, side: Side) -> &Player {
        self.state.player(side)
    }
    pub fn general_captured(&self, side: Side) -> bool {
        self.state.general_captured(side)
    }
    pub fn result(&self) -> Option<MatchResult> {
        self.state.result()
    }
    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }
    pub fn layouts(&self) -> &Pair<Layout> {
        self.state.layouts()
    }
}

impl Default for Match {
    fn default() -> Self {
        Self::standard()
    }
}

impl Turn for Match {
    #[inline]
    fn turn(&self) -> Side {
        self.state.turn()
    }
}

impl AsRef<Position> for Match {
    fn as_ref(&self) -> &Position {
        self.state.as_ref()
    }
}

impl Pos for Match {}

impl Tiles for Match {}
