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
use std::fmt;

use super::material::{Kind, Readiness, Side, Stance};
use super::square::Square;

/// Index of a piece in the position's piece arena. Ids are stable for the
/// whole match; captured pieces keep theirs.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PieceId(u8);

impl PieceId {
    #[inline]
    pub(crate) const fn new(index: usize) -> Self {
        Self(index as u8)
    }
    #[inline]
    pub const fn to_index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub enum Variant {
    Archer,
    Soldier {
        stance: Stance,
        can_switch: bool,
    },
    Cannon {
        readiness: Readiness,
        previous: Readiness,
        assists: Vec<PieceId>,
    },
    General,
}

impl Variant {
    pub fn new(kind: Kind) -> Self {
        match kind {
            Kind::Archer => Variant::Archer,
            Kind::Soldier => Variant::Soldier {
                stance: Stance::Offense,
                can_switch: true,
            },
            Kind::Cannon => Variant::Cannon {
                readiness: Readiness::Ready,
                previous: Readiness::Ready,
                assists: Vec::new(),
            },
            Kind::General => Variant::General,
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Variant::Archer => Kind::Archer,
            Variant::Soldier { .. } => Kind::Soldier,
            Variant::Cannon { .. } => Kind::Cannon,
            Variant::General => Kind::General,
        }
    }

    /// Budget maxima as `(movement, attack)`.
    pub fn maxima(&self) -> (u8, u8) {
        match self {
            Variant::Archer => (2, 2),
            Variant::Soldier {
                stance: Stance::Offense,
                ..
            } => (1, 1),
            Variant::Soldier {
                stance: Stance::Defense,
                ..
            } => (0, 0),
            Variant::Cannon { .. } => (1, 1),
            Variant::General => (2, 1),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct Piece {
    id: PieceId,
    side: Side,
    variant: Variant,
    square: Option<Square>,
    movement: u8,
    attack: u8,
    start_of_turn: Option<Square>,
    start_of_game: Square,
    enabled: bool,
    assisting: bool,
}

impl Piece {
    pub fn new(id: PieceId, side: Side, kind: Kind, square: Square) -> Self {
        let variant = Variant::new(kind);
        let (movement, attack) = variant.maxima();
        Self {
            id,
            side,
            variant,
            square: Some(square),
            movement,
            attack,
            start_of_turn: Some(square),
            start_of_game: square,
            enabled: true,
            assisting: false,
        }
    }

    #[inline]
    pub fn id(&self) -> PieceId {
        self.id
    }
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }
    #[inline]
    pub fn kind(&self) -> Kind {
        self.variant.kind()
    }
    #[inline]
    pub fn variant(&self) -> &Variant {
        &self.variant
    }
    /// `None` once the piece has been captured.
    #[inline]
    pub fn square(&self) -> Option<Square> {
        self.square
    }
    #[inline]
    pub fn movement(&self) -> u8 {
        self.movement
    }
    #[inline]
    pub fn attack(&self) -> u8 {
        self.attack
    }
    #[inline]
    pub fn start_of_turn(&self) -> Option<Square> {
        self.start_of_turn
    }
    #[inline]
    pub fn start_of_game(&self) -> Square {
        self.start_of_game
    }
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
    #[inline]
    pub fn is_assisting(&self) -> bool {
        self.assisting
    }
    #[inline]
    pub fn max_movement(&self) -> u8 {
        self.variant.maxima().0
    }
    #[inline]
    pub fn max_attack(&self) -> u8 {
        self.variant.maxima().1
    }

    pub fn stance(&self) -> Option<Stance> {
        match self.variant {
            Variant::Soldier { stance, .. } => Some(stance),
            _ => None,
        }
    }
    pub fn readiness(&self) -> Option<Readiness> {
        match self.variant {
            Variant::Cannon { readiness, .. } => Some(readiness),
            _ => None,
        }
    }
    pub fn assists(&self) -> &[PieceId] {
        match &self.variant {
            Variant::Cannon { assists, .. } => assists,
            _ => &[],
        }
    }
    pub fn can_switch(&self) -> bool {
        matches!(self.variant, Variant::Soldier { can_switch: true, .. })
    }
    pub fn is_defending_soldier(&self) -> bool {
        self.stance() == Some(Stance::Defense)
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.movement == 0 && self.attack == 0
    }

    /// Both budgets have been dipped into this action.
    #[inline]
    pub fn has_moved(&self) -> bool {
        self.movement != self.max_movement() && self.attack != self.max_attack()
    }

    /// Whether the owning side may pick this piece as its active piece.
    pub fn is_selectable(&self) -> bool {
        self.square.is_some()
            && self.enabled
            && !self.assisting
            && (!self.is_exhausted() || (self.is_defending_soldier() && self.can_switch()))
    }

    pub fn spend_movement(&mut self, amount: u8) {
        self.movement = self.movement.saturating_sub(amount);
    }
    pub fn spend_attack(&mut self, amount: u8) {
        self.attack = self.attack.saturating_sub(amount);
    }
    pub fn exhaust(&mut self) {
        self.movement = 0;
        self.attack = 0;
    }

    /// Restores full budgets and clears per-turn flags. Called for every
    /// piece of the side whose turn begins.
    pub fn reset(&mut self) {
        let (movement, attack) = self.variant.maxima();
        self.movement = movement;
        self.attack = attack;
        self.enabled = true;
        self.assisting = false;
        match &mut self.variant {
            Variant::Soldier { can_switch, .. } => *can_switch = true,
            Variant::Cannon {
                readiness,
                previous,
                assists,
            } => {
                if matches!(readiness, Readiness::Move | Readiness::Attack) {
                    *readiness = *previous;
                }
                assists.clear();
            }
            _ => {}
        }
    }

    /// A copy holding the full budgets of its current stance.
    pub fn refreshed(&self) -> Self {
        let mut piece = self.clone();
        let (movement, attack) = piece.variant.maxima();
        piece.movement = movement;
        piece.attack = attack;
        piece
    }

    /// Ends this piece's action. A cannon keeps its budgets since its use is
    /// gated by readiness instead.
    pub fn end_action(&mut self) {
        if let Variant::Soldier { can_switch, .. } = &mut self.variant {
            *can_switch = true;
        }
        if let Variant::Cannon { assists, .. } = &mut self.variant {
            assists.clear();
        } else {
            self.exhaust();
        }
        self.assisting = false;
    }

    /// Flips a soldier's stance and sets its budgets to the new maxima.
    /// Returns `false` if this is not a soldier or it already switched
    /// during the current action.
    pub fn switch_stance(&mut self) -> bool {
        let Variant::Soldier { stance, can_switch } = &mut self.variant else {
            return false;
        };
        if !*can_switch {
            return false;
        }
        *stance = !*stance;
        *can_switch = false;
        let (movement, attack) = self.variant.maxima();
        self.movement = movement;
        self.attack = attack;
        true
    }

    /// Lends this piece to a cannon. The piece is drained once the cannon
    /// acts.
    pub fn assist(&mut self) {
        self.assisting = true;
    }

    pub fn release(&mut self) {
        self.assisting = false;
    }

    /// Spends an assisting piece: its action ends and it may not be
    /// selected again this turn.
    pub fn drain(&mut self) {
        self.end_action();
        self.enabled = false;
        if let Variant::Soldier { can_switch, .. } = &mut self.variant {
            *can_switch = false;
        }
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn set_readiness(&mut self, value: Readiness) {
        if let Variant::Cannon {
            readiness,
            previous,
            ..
        } = &mut self.variant
        {
            *previous = *readiness;
            *readiness = value;
        }
    }

    /// Abandons a pending assist flow, restoring the readiness held before
    /// it started. Returns the released assistants.
    pub fn revert_readiness(&mut self) -> Vec<PieceId> {
        if let Variant::Cannon {
            readiness,
            previous,
            assists,
        } = &mut self.variant
        {
            *readiness = *previous;
            return std::mem::take(assists);
        }
        Vec::new()
    }

    pub fn add_assist(&mut self, id: PieceId) {
        if let Variant::Cannon { assists, .. } = &mut self.variant {
            if !assists.contains(&id) {
                assists.push(id);
            }
        }
    }

    pub fn take_assists(&mut self) -> Vec<PieceId> {
        match &mut self.variant {
            Variant::Cannon { assists, .. } => std::mem::take(assists),
            _ => Vec::new(),
        }
    }

    pub(crate) fn set_square(&mut self, square: Option<Square>) {
        self.square = square;
    }

    pub(crate) fn mark_start_of_turn(&mut self) {
        self.start_of_turn = self.square;
    }
}

#[cfg(test)]
impl Piece {
    pub(crate) fn set_budgets(mut self, movement: u8, attack: u8) -> Self {
        self.movement = movement;
        self.attack = attack;
        self
    }
    pub(crate) fn set_stance(mut self, value: Stance) -> Self {
        if let Variant::Soldier { stance, .. } = &mut self.variant {
            *stance = value;
        }
        let (movement, attack) = self.variant.maxima();
        self.movement = movement;
        self.attack = attack;
        self
    }
    pub(crate) fn set_ready(mut self, value: Readiness) -> Self {
        if let Variant::Cannon {
            readiness,
            previous,
            ..
        } = &mut self.variant
        {
            *readiness = value;
            *previous = value;
        }
        self
    }
}
