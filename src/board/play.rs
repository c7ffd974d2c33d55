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
use log::{debug, info};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::game::{DrawReason, MatchResult, WinReason};

use super::layout::{Formation, Layout};
use super::material::{Kind, Pair, Readiness, Side};
use super::moves::{intercepting_soldier, Tiles};
use super::piece::{Piece, PieceId};
use super::player::Player;
use super::position::{Pos, Position};
use super::square::{Mask, Square, NEIGHBORS};
use super::threat::ThreatMap;
use super::Turn;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    #[error("Not a legal selection")]
    InvalidSelection,
    #[error("Piece has no budget left for this action")]
    OutOfBudget,
    #[error("Not allowed now: {0}")]
    IllegalState(&'static str),
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),
}

use PlayError::*;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Idle,
    SelectingMove,
    SelectingAttack,
    /// A cannon is gathering the friendlies it needs.
    SelectingAbility,
}

/// What a resolved selection did to the board.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct MatchEvent {
    pub piece: PieceId,
    pub moved: Option<(Square, Square)>,
    pub captured: Option<PieceId>,
    pub general_captured: Option<Side>,
    pub result: Option<MatchResult>,
    pub action_ended: bool,
}

impl MatchEvent {
    fn new(piece: PieceId) -> Self {
        Self {
            piece,
            moved: None,
            captured: None,
            general_captured: None,
            result: None,
            action_ended: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TurnStart {
    position: Position,
    players: Pair<Player>,
    generals_captured: Pair<bool>,
}

/// The rules engine. Every public mutating method is a transaction: when
/// it fails, the state is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayState {
    layouts: Pair<Layout>,
    position: Position,
    players: Pair<Player>,
    turn: Side,
    actions_remaining: u8,
    phase: Phase,
    generals_captured: Pair<bool>,
    result: Option<MatchResult>,
    threats: ThreatMap,
    turn_start: TurnStart,
}

impl PlayState {
    pub fn new(formations: Pair<Formation>) -> Self {
        let layouts = Pair::new(
            Layout::lookup(Side::Challenger, *formations.challenger()).clone(),
            Layout::lookup(Side::Opposition, *formations.opposition()).clone(),
        );
        let position = Position::from_layouts(layouts.challenger(), layouts.opposition());
        Self::seed(layouts, position)
    }

    /// Starts a match from custom layouts.
    ///
    /// # Errors
    ///
    /// Returns `LayoutError::Overlap` if the layouts share a cell.
    pub fn from_layouts(challenger: &Layout, opposition: &Layout) -> Result<Self> {
        let position = Position::new(challenger, opposition)?;
        let layouts = Pair::new(challenger.clone(), opposition.clone());
        Ok(Self::seed(layouts, position))
    }

    fn seed(layouts: Pair<Layout>, position: Position) -> Self {
        let roster = |side: Side| -> Vec<PieceId> {
            position
                .pieces_of(side)
                .into_iter()
                .map(|piece| piece.id())
                .collect()
        };
        let players = Pair::new(
            Player::new(Side::Challenger, roster(Side::Challenger)),
            Player::new(Side::Opposition, roster(Side::Opposition)),
        );
        let threats = ThreatMap::compute(&position);
        let turn_start = TurnStart {
            position: position.clone(),
            players: players.clone(),
            generals_captured: Pair::default(),
        };
        Self {
            layouts,
            position,
            players,
            turn: Side::Challenger,
            actions_remaining: 2,
            phase: Phase::Idle,
            generals_captured: Pair::default(),
            result: None,
            threats,
            turn_start,
        }
    }

    pub fn actions_remaining(&self) -> u8 {
        self.actions_remaining
    }
    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn player(&self, side: Side) -> &Player {
        &self.players[side]
    }
    pub fn active_piece(&self) -> Option<PieceId> {
        self.players[self.turn].active()
    }
    pub fn result(&self) -> Option<MatchResult> {
        self.result
    }
    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }
    pub fn general_captured(&self, side: Side) -> bool {
        self.generals_captured[side]
    }
    pub fn layouts(&self) -> &Pair<Layout> {
        &self.layouts
    }
    pub fn threat_map(&self) -> &ThreatMap {
        &self.threats
    }

    /// Validates an externally supplied piece index.
    ///
    /// # Errors
    ///
    /// Returns `PlayError::InvalidArgument` if no piece has that index.
    pub fn piece_id(&self, index: usize) -> Result<PieceId> {
        self.position.piece_id(index)
    }

    pub fn legal_move_tiles(&self, id: PieceId) -> Result<Mask> {
        self.checked(id)?;
        Ok(self.position.moveable_tiles(id))
    }
    pub fn legal_attack_tiles(&self, id: PieceId) -> Result<Mask> {
        self.checked(id)?;
        Ok(self.position.attackable_tiles(id))
    }
    pub fn threat_tiles(&self, id: PieceId) -> Result<Mask> {
        self.checked(id)?;
        Ok(self.position.threat_tiles(id))
    }

    /// Makes `id` the active piece. While a cannon is gathering assistance,
    /// picking a friendly lends it to the cannon instead, and the resulting
    /// event is returned.
    pub fn select_piece(&mut self, id: PieceId) -> Result<Option<MatchEvent>> {
        self.transact(|state| state.do_select(id))
    }

    /// Enters move selection for the active piece and returns the legal
    /// destinations. A ready cannon first asks for assistance and returns
    /// the friendlies able to give it.
    pub fn choose_move(&mut self) -> Result<Mask> {
        self.transact(|state| state.do_choose(Phase::SelectingMove))
    }

    /// Attack counterpart of `choose_move`.
    pub fn choose_attack(&mut self) -> Result<Mask> {
        self.transact(|state| state.do_choose(Phase::SelectingAttack))
    }

    /// Starts readying the active, unready cannon. Returns the friendlies
    /// able to assist.
    pub fn ready_cannon(&mut self) -> Result<Mask> {
        self.transact(|state| state.do_ready())
    }

    /// Flips the active soldier's stance. It spends no budget but uses up
    /// one of the turn's actions, and only works once per piece action.
    pub fn switch_stance(&mut self) -> Result<()> {
        self.transact(|state| state.do_switch_stance())
    }

    /// Completes the pending selection with the chosen cell.
    pub fn resolve_selection(&mut self, square: Square) -> Result<MatchEvent> {
        self.transact(|state| state.do_resolve(square))
    }

    /// Drops the active piece and any pending selection at no cost.
    pub fn cancel(&mut self) -> Result<()> {
        self.transact(|state| {
            state.ensure_live()?;
            state.release_pending();
            state.players[state.turn].set_active(None);
            Ok(())
        })
    }

    /// Select, choose and resolve a move in one step.
    pub fn apply_move(&mut self, id: PieceId, square: Square) -> Result<MatchEvent> {
        self.transact(|state| state.do_apply(id, square, Phase::SelectingMove))
    }

    /// Select, choose and resolve an attack in one step.
    pub fn apply_attack(&mut self, id: PieceId, square: Square) -> Result<MatchEvent> {
        self.transact(|state| state.do_apply(id, square, Phase::SelectingAttack))
    }

    pub fn end_action(&mut self) -> Result<()> {
        self.transact(|state| {
            state.ensure_live()?;
            let id = state.active()?;
            state.release_pending();
            state.end_piece_action(id);
            Ok(())
        })
    }

    /// Passes the turn. Returns the match result if the pending capture of
    /// a general was scored.
    pub fn end_turn(&mut self) -> Result<Option<MatchResult>> {
        self.transact(|state| state.do_end_turn())
    }

    /// Rolls the board back to the start of the current turn.
    pub fn undo_turn(&mut self) -> Result<()> {
        self.transact(|state| {
            state.ensure_live()?;
            let TurnStart {
                position,
                players,
                generals_captured,
            } = state.turn_start.clone();
            state.position = position;
            state.players = players;
            state.generals_captured = generals_captured;
            state.actions_remaining = 2;
            state.phase = Phase::Idle;
            debug!("{} undid the turn", state.turn);
            Ok(())
        })
    }

    pub fn surrender(&mut self) -> Result<MatchResult> {
        self.transact(|state| {
            state.ensure_live()?;
            state.release_pending();
            state.generals_captured[state.turn] = true;
            let result = MatchResult::Win(!state.turn, WinReason::Surrendered);
            info!("{} surrendered", state.turn);
            state.result = Some(result);
            Ok(result)
        })
    }

    /// Starts over from the layouts this match was created with.
    pub fn reset_match(&mut self) {
        let position = Position::from_layouts(self.layouts.challenger(), self.layouts.opposition());
        *self = Self::seed(self.layouts.clone(), position);
        debug!("match reset");
    }

    fn transact<R, F>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Self) -> Result<R>,
    {
        let backup = self.clone();
        match f(self) {
            Ok(value) => {
                self.threats = ThreatMap::compute(&self.position);
                Ok(value)
            }
            Err(err) => {
                *self = backup;
                Err(err)
            }
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.result.is_some() {
            return Err(IllegalState("the match is over").into());
        }
        Ok(())
    }

    fn checked(&self, id: PieceId) -> Result<&Piece> {
        if id.to_index() >= self.position.pieces().len() {
            return Err(InvalidArgument("unknown piece").into());
        }
        Ok(self.position.piece(id))
    }

    fn active(&self) -> Result<PieceId> {
        self.players[self.turn]
            .active()
            .ok_or_else(|| IllegalState("no active piece").into())
    }

    fn do_select(&mut self, id: PieceId) -> Result<Option<MatchEvent>> {
        self.ensure_live()?;
        let piece = self.checked(id)?;
        let (side, square, selectable) = (piece.side(), piece.square(), piece.is_selectable());
        if self.phase == Phase::SelectingAbility {
            let square = square.ok_or(InvalidSelection)?;
            return self.do_assist(square).map(Some);
        }
        if side != self.turn {
            return Err(InvalidSelection.into());
        }
        let current = self.players[self.turn].active();
        if current == Some(id) {
            return Ok(None);
        }
        if let Some(current) = current {
            if matches!(self.phase, Phase::SelectingMove | Phase::SelectingAttack) {
                return Err(IllegalState("another piece is choosing a target").into());
            }
            if self.actions_remaining == 1 && self.position.piece(current).has_moved() {
                return Err(IllegalState("the last action belongs to the active piece").into());
            }
        }
        if !selectable {
            return Err(InvalidSelection.into());
        }
        self.players[self.turn].set_active(Some(id));
        self.phase = Phase::Idle;
        Ok(None)
    }

    fn do_choose(&mut self, phase: Phase) -> Result<Mask> {
        self.ensure_live()?;
        let id = self.active()?;
        if self.phase != Phase::Idle {
            return Err(IllegalState("a selection is already in progress").into());
        }
        let piece = self.position.piece(id);
        let (budget, target) = match phase {
            Phase::SelectingMove => (piece.movement(), Readiness::Move),
            _ => (piece.attack(), Readiness::Attack),
        };
        if budget == 0 {
            return Err(OutOfBudget.into());
        }
        match piece.readiness() {
            Some(Readiness::Unready) => Err(IllegalState("the cannon is not ready").into()),
            Some(_) => self.begin_assist(id, target),
            None => {
                self.phase = phase;
                Ok(self.selection_tiles(id))
            }
        }
    }

    fn do_ready(&mut self) -> Result<Mask> {
        self.ensure_live()?;
        let id = self.active()?;
        if self.phase != Phase::Idle {
            return Err(IllegalState("a selection is already in progress").into());
        }
        match self.position.piece(id).readiness() {
            Some(Readiness::Unready) => self.begin_assist(id, Readiness::Ready),
            Some(_) => Err(IllegalState("the cannon is already ready").into()),
            None => Err(IllegalState("only a cannon can be readied").into()),
        }
    }

    fn do_switch_stance(&mut self) -> Result<()> {
        self.ensure_live()?;
        let id = self.active()?;
        if self.phase != Phase::Idle {
            return Err(IllegalState("a selection is already in progress").into());
        }
        if self.actions_remaining == 0 {
            return Err(IllegalState("no actions remaining").into());
        }
        let piece = self.position.piece_mut(id);
        if piece.kind() != Kind::Soldier {
            return Err(IllegalState("only a soldier has a stance").into());
        }
        if !piece.switch_stance() {
            return Err(IllegalState("stance already switched this action").into());
        }
        debug!("soldier {} switched to {:?}", id, piece.stance());

        // The switch takes an action slot but leaves the soldier's action
        // open.
        self.close_initial_action(id);
        let player = &mut self.players[self.turn];
        if player.initial_action() == Some(id) {
            player.set_initial_action(None);
        }
        self.spend_action();
        if self.actions_remaining == 0 {
            self.players[self.turn].set_active(None);
        }
        Ok(())
    }

    fn do_resolve(&mut self, square: Square) -> Result<MatchEvent> {
        self.ensure_live()?;
        match self.phase {
            Phase::Idle => Err(IllegalState("nothing to resolve").into()),
            Phase::SelectingAbility => self.do_assist(square),
            Phase::SelectingMove => self.resolve_move(square),
            Phase::SelectingAttack => self.resolve_attack(square),
        }
    }

    fn do_apply(&mut self, id: PieceId, square: Square, phase: Phase) -> Result<MatchEvent> {
        self.ensure_live()?;
        if self.checked(id)?.kind() == Kind::Cannon {
            return Err(IllegalState("a cannon acts through its assistance flow").into());
        }
        if self.phase != Phase::Idle {
            return Err(IllegalState("a selection is already in progress").into());
        }
        self.do_select(id)?;
        self.do_choose(phase)?;
        self.do_resolve(square)
    }

    fn selection_tiles(&self, id: PieceId) -> Mask {
        match self.phase {
            Phase::SelectingMove => self.position.moveable_tiles(id),
            Phase::SelectingAttack => self.position.attackable_tiles(id),
            _ => Mask::empty(),
        }
    }

    /// Friendlies next to the cannon that still have movement left.
    fn eligible_assistants(&self, cannon: PieceId) -> Mask {
        let piece = self.position.piece(cannon);
        let Some(square) = piece.square() else {
            return Mask::empty();
        };
        (NEIGHBORS[square] & self.position.occupied_by(piece.side()))
            .iter()
            .filter(|square| {
                self.position.contents(*square).map_or(false, |friend| {
                    friend.is_enabled() && !friend.is_assisting() && friend.movement() > 0
                })
            })
            .collect()
    }

    fn begin_assist(&mut self, cannon: PieceId, target: Readiness) -> Result<Mask> {
        let eligible = self.eligible_assistants(cannon);
        if eligible.len() < 2 {
            return Err(IllegalState("a cannon needs two adjacent friendlies").into());
        }
        // Readying keeps the cannon unready until both friendlies commit.
        if target != Readiness::Ready {
            self.position.piece_mut(cannon).set_readiness(target);
        }
        self.phase = Phase::SelectingAbility;
        debug!("cannon {} gathering assistance for {}", cannon, target);
        Ok(eligible)
    }

    fn do_assist(&mut self, square: Square) -> Result<MatchEvent> {
        let cannon = self.active()?;
        if !self.eligible_assistants(cannon).contains(square) {
            return Err(InvalidSelection.into());
        }
        let friend = self.position[square].ok_or(InvalidSelection)?;
        self.position.piece_mut(friend).assist();
        self.position.piece_mut(cannon).add_assist(friend);
        let mut event = MatchEvent::new(cannon);
        if self.position.piece(cannon).assists().len() < 2 {
            return Ok(event);
        }
        match self.position.piece(cannon).readiness() {
            Some(Readiness::Unready) => {
                self.drain_assistants(cannon);
                self.position.piece_mut(cannon).set_readiness(Readiness::Ready);
                debug!("cannon {} is ready", cannon);
                self.settle_action(cannon, true, &mut event);
            }
            Some(Readiness::Move) => self.phase = Phase::SelectingMove,
            Some(Readiness::Attack) => self.phase = Phase::SelectingAttack,
            _ => return Err(IllegalState("the cannon is not gathering assistance").into()),
        }
        Ok(event)
    }

    fn resolve_move(&mut self, square: Square) -> Result<MatchEvent> {
        let id = self.active()?;
        if !self.position.moveable_tiles(id).contains(square) {
            return Err(InvalidSelection.into());
        }
        let piece = self.position.piece(id);
        let from = piece
            .square()
            .ok_or(IllegalState("the active piece is off the board"))?;
        let is_cannon = piece.kind() == Kind::Cannon;
        let distance = from.distance(square) as u8;
        let mut event = MatchEvent::new(id);

        let piece = self.position.piece_mut(id);
        piece.spend_movement(distance);
        if !is_cannon {
            piece.spend_attack(distance);
        }
        // Moving onto an enemy takes it; the path there is clear by
        // construction, so no soldier can intercept.
        if let Some(target) = self.position[square] {
            self.capture(target, &mut event);
            self.position.piece_mut(id).exhaust();
        }
        self.position.relocate(id, square);
        event.moved = Some((from, square));
        debug!("{} moved {} -> {}", id, from, square);

        if is_cannon {
            self.drain_assistants(id);
            self.position.piece_mut(id).set_readiness(Readiness::Ready);
        }
        self.settle_action(id, is_cannon, &mut event);
        event.result = self.result;
        Ok(event)
    }

    fn resolve_attack(&mut self, square: Square) -> Result<MatchEvent> {
        let id = self.active()?;
        if !self.position.attackable_tiles(id).contains(square) {
            return Err(InvalidSelection.into());
        }
        let target = self.position[square].ok_or(IllegalState("no piece on the target cell"))?;
        let piece = self.position.piece(id);
        let from = piece
            .square()
            .ok_or(IllegalState("the active piece is off the board"))?;
        let is_cannon = piece.kind() == Kind::Cannon;
        let defender = self.position.piece(target);
        let victim = if defender.kind() == Kind::Soldier {
            target
        } else {
            intercepting_soldier(&self.position, from, square, defender.side()).unwrap_or(target)
        };
        let mut event = MatchEvent::new(id);

        if is_cannon {
            self.drain_assistants(id);
            self.position.piece_mut(id).set_readiness(Readiness::Unready);
        }
        if victim != target {
            debug!("soldier {} intercepted the attack on {}", victim, target);
        }
        self.capture(victim, &mut event);
        self.position.piece_mut(id).exhaust();
        self.settle_action(id, is_cannon, &mut event);
        event.result = self.result;
        Ok(event)
    }

    fn capture(&mut self, victim: PieceId, event: &mut MatchEvent) {
        let piece = self.position.piece(victim);
        let (side, kind) = (piece.side(), piece.kind());
        self.position.remove(victim);
        self.players[side].record_capture(victim);
        event.captured = Some(victim);
        debug!("{} {} captured", kind, victim);
        if kind == Kind::General {
            event.general_captured = Some(side);
            self.capture_general(side);
        }
    }

    fn capture_general(&mut self, side: Side) {
        self.generals_captured[side] = true;
        // The opposition only gets scored once its reply turn is over.
        if side == Side::Challenger {
            let result = if self.generals_captured[Side::Opposition] {
                MatchResult::Draw(DrawReason::BothGeneralsCaptured)
            } else {
                MatchResult::Win(Side::Opposition, WinReason::GeneralCaptured)
            };
            info!("match over: {:?}", result);
            self.result = Some(result);
        }
    }

    fn drain_assistants(&mut self, cannon: PieceId) {
        for friend in self.position.piece_mut(cannon).take_assists() {
            self.position.piece_mut(friend).drain();
        }
    }

    /// Releases the friendlies a pending cannon selection has claimed.
    fn release_pending(&mut self) {
        if let Some(id) = self.players[self.turn].active() {
            let piece = self.position.piece_mut(id);
            let released = match piece.readiness() {
                Some(Readiness::Move | Readiness::Attack) => piece.revert_readiness(),
                Some(_) => piece.take_assists(),
                None => Vec::new(),
            };
            for friend in released {
                self.position.piece_mut(friend).release();
            }
        }
        self.phase = Phase::Idle;
    }

    /// Action bookkeeping after the active piece acted.
    fn settle_action(&mut self, id: PieceId, end: bool, event: &mut MatchEvent) {
        self.close_initial_action(id);
        if end || self.position.piece(id).is_exhausted() {
            self.end_piece_action(id);
            event.action_ended = true;
        } else {
            if self.actions_remaining == 2 {
                self.players[self.turn].set_initial_action(Some(id));
            }
            self.phase = Phase::Idle;
        }
    }

    /// Once a piece other than the initial one acts, the initial piece's
    /// action is over.
    fn close_initial_action(&mut self, id: PieceId) {
        let side = self.turn;
        if let Some(initial) = self.players[side].initial_action() {
            if self.actions_remaining == 2 && initial != id {
                self.position.piece_mut(initial).end_action();
                self.players[side].set_initial_action(None);
                self.spend_action();
            }
        }
    }

    fn end_piece_action(&mut self, id: PieceId) {
        self.position.piece_mut(id).end_action();
        let player = &mut self.players[self.turn];
        if player.initial_action() == Some(id) {
            player.set_initial_action(None);
        }
        player.set_active(None);
        self.phase = Phase::Idle;
        self.spend_action();
    }

    /// Uses up one action slot. The side is locked once none are left.
    fn spend_action(&mut self) {
        self.actions_remaining = self.actions_remaining.saturating_sub(1);
        if self.actions_remaining == 0 {
            let side = self.turn;
            for piece in self.position.pieces_mut().filter(|piece| piece.side() == side) {
                piece.disable();
            }
        }
    }

    fn do_end_turn(&mut self) -> Result<Option<MatchResult>> {
        self.ensure_live()?;
        self.release_pending();
        if let Some(id) = self.players[self.turn].active() {
            self.position.piece_mut(id).end_action();
        }
        for side in Side::iter() {
            self.players[side].end_turn();
        }
        self.turn = !self.turn;
        self.actions_remaining = 2;
        let side = self.turn;
        for piece in self.position.pieces_mut() {
            piece.mark_start_of_turn();
            if piece.side() == side {
                piece.reset();
            }
        }
        debug!("turn passes to {}", self.turn);
        self.score_pending_capture();
        self.turn_start = TurnStart {
            position: self.position.clone(),
            players: self.players.clone(),
            generals_captured: self.generals_captured,
        };
        Ok(self.result)
    }

    fn score_pending_capture(&mut self) {
        if self.turn != Side::Challenger {
            return;
        }
        let result = match (
            self.generals_captured[Side::Challenger],
            self.generals_captured[Side::Opposition],
        ) {
            (true, true) => MatchResult::Draw(DrawReason::BothGeneralsCaptured),
            (false, true) => MatchResult::Win(Side::Challenger, WinReason::GeneralCaptured),
            _ => return,
        };
        info!("match over: {:?}", result);
        self.result = Some(result);
    }
}

impl Turn for PlayState {
    fn turn(&self) -> Side {
        self.turn
    }
}

impl AsRef<Position> for PlayState {
    fn as_ref(&self) -> &Position {
        &self.position
    }
}

impl Pos for PlayState {}

impl Tiles for PlayState {}

#[cfg(test)]
impl PlayState {
    pub(crate) fn from_position(position: Position, turn: Side) -> Self {
        let mut state = Self::seed(Pair::new(Layout::empty(), Layout::empty()), position);
        state.turn = turn;
        state
    }
    pub(crate) fn id_at(&self, square: Square) -> PieceId {
        self.position.id_at(square)
    }
}
