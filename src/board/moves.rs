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

use strum::IntoEnumIterator;

use super::material::{Readiness, Side};
use super::piece::{Piece, PieceId};
use super::position::{Pos, Position};
use super::reach::{can_reach, Obstacles};
use super::square::{Direction, Mask, Offset, Square};

type TileFn = fn(&Position, &Piece) -> Mask;

/// Per-variant tile rules. The table is indexed by `Kind::to_index`.
pub struct TileRules {
    pub moveable: TileFn,
    pub attackable: TileFn,
    pub threat: TileFn,
}

static RULES: [TileRules; 4] = [
    TileRules {
        moveable: archer_moves,
        attackable: archer_attacks,
        threat: archer_attacks,
    },
    TileRules {
        moveable: soldier_moves,
        attackable: soldier_attacks,
        threat: soldier_attacks,
    },
    TileRules {
        moveable: cannon_moves,
        attackable: cannon_attacks,
        threat: no_tiles,
    },
    TileRules {
        moveable: general_moves,
        attackable: general_attacks,
        threat: no_tiles,
    },
];

#[inline]
fn rules(piece: &Piece) -> &'static TileRules {
    &RULES[piece.kind().to_index()]
}

pub fn moveable_tiles(pos: &Position, piece: &Piece) -> Mask {
    if piece.square().is_none() {
        return Mask::empty();
    }
    (rules(piece).moveable)(pos, piece)
}

pub fn attackable_tiles(pos: &Position, piece: &Piece) -> Mask {
    if piece.square().is_none() {
        return Mask::empty();
    }
    (rules(piece).attackable)(pos, piece)
}

/// Cells the piece would threaten. Cannons and generals report nothing
/// here; their look-ahead was never defined.
pub fn threat_tiles(pos: &Position, piece: &Piece) -> Mask {
    if piece.square().is_none() {
        return Mask::empty();
    }
    (rules(piece).threat)(pos, piece)
}

/// Tile queries by piece id for anything that owns a position. The id must
/// come from that position; public callers go through the checked queries
/// on `Match`.
pub(crate) trait Tiles: Pos {
    fn moveable_tiles(&self, id: PieceId) -> Mask {
        let pos: &Position = self.as_ref();
        moveable_tiles(pos, pos.piece(id))
    }
    fn attackable_tiles(&self, id: PieceId) -> Mask {
        let pos: &Position = self.as_ref();
        attackable_tiles(pos, pos.piece(id))
    }
    fn threat_tiles(&self, id: PieceId) -> Mask {
        let pos: &Position = self.as_ref();
        threat_tiles(pos, pos.piece(id))
    }
}

impl Tiles for Position {}

fn no_tiles(_pos: &Position, _piece: &Piece) -> Mask {
    Mask::empty()
}

/// Every non-friendly cell within `range`, without any path check.
fn in_range(pos: &Position, piece: &Piece, range: u8) -> Mask {
    let Some(from) = piece.square() else {
        return Mask::empty();
    };
    Mask::within(from, range as usize) - pos.occupied_by(piece.side()) - from
}

/// Non-friendly cells within `budget` that the piece can walk to. Enemies
/// may be the destination but never a cell along the way.
fn approachable(pos: &Position, piece: &Piece, budget: u8) -> Mask {
    let Some(from) = piece.square() else {
        return Mask::empty();
    };
    let obstacles = Obstacles {
        friendly: pos.occupied_by(piece.side()),
        enemy: pos.occupied_by(!piece.side()),
    };
    in_range(pos, piece, budget)
        .iter()
        .filter(|target| can_reach(*target, from, &obstacles, budget as isize, true))
        .collect()
}

fn archer_moves(pos: &Position, piece: &Piece) -> Mask {
    let Some(from) = piece.square() else {
        return Mask::empty();
    };
    let far_enemies = pos
        .occupied_by(!piece.side())
        .iter()
        .filter(|square| square.distance(from) == 2)
        .collect::<Mask>();
    approachable(pos, piece, piece.movement()) - far_enemies
}

fn archer_attacks(pos: &Position, piece: &Piece) -> Mask {
    let Some(from) = piece.square() else {
        return Mask::empty();
    };
    let mut tiles = in_range(pos, piece, piece.attack());

    // Shadows are cast by the defending soldiers found in column-major
    // order. The scan ends at the first soldier whose larger signed offset
    // reaches the attack budget, so soldiers left of or above the archer
    // never end it.
    let range = piece.attack() as isize;
    let mut soldiers = Vec::new();
    for dc in -range..=range {
        for dr in -range..=range {
            let Some(square) = from + Offset::new(dc, dr) else {
                continue;
            };
            if let Some(other) = pos.contents(square) {
                if other.side() != piece.side() && other.is_defending_soldier() {
                    soldiers.push(square);
                }
            }
        }
    }
    for soldier in soldiers {
        let Offset { x, y } = soldier - from;
        if x.max(y) >= range {
            break;
        }
        tiles = tiles - shadow(from, soldier);
    }
    tiles
}

/// The cells hidden behind a defending soldier when seen from `from`.
pub fn shadow(from: Square, soldier: Square) -> Mask {
    let Offset { x, y } = (soldier - from).signum();
    let offsets = match (x, y) {
        (_, 0) => [Offset::new(x, -1), Offset::new(x, 0), Offset::new(x, 1)],
        (0, _) => [Offset::new(-1, y), Offset::new(0, y), Offset::new(1, y)],
        _ => [Offset::new(x, 0), Offset::new(x, y), Offset::new(0, y)],
    };
    offsets
        .iter()
        .filter_map(|offset| soldier + offset)
        .collect()
}

fn soldier_moves(pos: &Position, piece: &Piece) -> Mask {
    if piece.is_defending_soldier() {
        return Mask::empty();
    }
    approachable(pos, piece, piece.movement())
}

fn soldier_attacks(pos: &Position, piece: &Piece) -> Mask {
    if piece.is_defending_soldier() || piece.attack() == 0 {
        return Mask::empty();
    }
    approachable(pos, piece, piece.attack())
}

fn general_moves(pos: &Position, piece: &Piece) -> Mask {
    approachable(pos, piece, piece.movement())
}

fn general_attacks(pos: &Position, piece: &Piece) -> Mask {
    in_range(pos, piece, piece.attack())
}

fn cannon_moves(pos: &Position, piece: &Piece) -> Mask {
    if piece.readiness() == Some(Readiness::Unready) {
        return Mask::empty();
    }
    approachable(pos, piece, piece.movement()) - pos.occupied()
}

fn cannon_attacks(pos: &Position, piece: &Piece) -> Mask {
    let Some(from) = piece.square() else {
        return Mask::empty();
    };
    if piece.readiness() == Some(Readiness::Unready) || piece.attack() == 0 {
        return Mask::empty();
    }
    let friendly = pos.occupied_by(piece.side());
    let enemy = pos.occupied_by(!piece.side());
    let mut tiles = Mask::empty();
    for dir in Direction::iter() {
        let mut ray = Mask::empty();
        let mut current = from;
        while let Some(next) = current + dir {
            if friendly.contains(next) {
                ray = Mask::empty();
                break;
            }
            ray.set(next);
            if enemy.contains(next) {
                break;
            }
            current = next;
        }
        tiles |= ray;
    }
    tiles
}

/// Walks from `from` toward `to`, stepping both axes while they differ, and
/// returns the first defending soldier of `defender` met on the way. The end
/// cells are not inspected.
pub fn intercepting_soldier(pos: &Position, from: Square, to: Square, defender: Side) -> Option<PieceId> {
    let mut current = from;
    loop {
        let step = (to - current).signum();
        current = (current + step)?;
        if current == to {
            return None;
        }
        if let Some(piece) = pos.contents(current) {
            if piece.side() == defender && piece.is_defending_soldier() {
                return Some(piece.id());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use Kind::*;
    use Side::*;

    fn sq(col: usize, row: usize) -> Square {
        Square::new(col, row)
    }

    fn tiles_at(pos: &Position, square: Square) -> (Mask, Mask) {
        let id = pos.id_at(square);
        (pos.moveable_tiles(id), pos.attackable_tiles(id))
    }

    #[test]
    fn test_archer_moves_open_board() {
        let pos = Position::empty().with_piece(Challenger, Archer, sq(4, 4));
        let (moves, _) = tiles_at(&pos, sq(4, 4));
        assert_eq!(moves.len(), 24);
        assert!(!moves.contains(sq(4, 4)));
    }
    #[test]
    fn test_archer_boxed_in() {
        let pos = Position::empty()
            .with_piece(Challenger, Archer, sq(0, 0))
            .with_piece(Challenger, Soldier, sq(1, 0))
            .with_piece(Challenger, Soldier, sq(0, 1))
            .with_piece(Challenger, General, sq(1, 1));
        let (moves, _) = tiles_at(&pos, sq(0, 0));
        assert!(moves.is_empty());
    }
    #[test]
    fn test_archer_cannot_land_on_far_enemy() {
        let pos = Position::empty()
            .with_piece(Challenger, Archer, sq(4, 4))
            .with_piece(Opposition, General, sq(6, 4))
            .with_piece(Opposition, Archer, sq(3, 3));
        let (moves, _) = tiles_at(&pos, sq(4, 4));
        assert!(!moves.contains(sq(6, 4)));
        assert!(moves.contains(sq(3, 3)));
    }
    #[test]
    fn test_archer_attacks_skip_friendlies() {
        let pos = Position::empty()
            .with_piece(Challenger, Archer, sq(4, 4))
            .with_piece(Challenger, Soldier, sq(5, 5));
        let (_, attacks) = tiles_at(&pos, sq(4, 4));
        assert_eq!(attacks.len(), 23);
        assert!(!attacks.contains(sq(5, 5)));
        assert!(!attacks.contains(sq(4, 4)));
    }
    #[test]
    fn test_archer_shadow_horizontal() {
        let pos = Position::empty()
            .with_piece(Challenger, Archer, sq(4, 4))
            .with_piece(Opposition, Soldier, sq(5, 4))
            .update(sq(5, 4), |p| p.set_stance(Stance::Defense));
        let (_, attacks) = tiles_at(&pos, sq(4, 4));
        assert!(attacks.contains(sq(5, 4)));
        assert!(!attacks.contains(sq(6, 3)));
        assert!(!attacks.contains(sq(6, 4)));
        assert!(!attacks.contains(sq(6, 5)));
        assert!(attacks.contains(sq(6, 6)));
        assert!(attacks.contains(sq(6, 2)));
    }
    #[test]
    fn test_archer_shadow_vertical() {
        let pos = Position::empty()
            .with_piece(Challenger, Archer, sq(4, 4))
            .with_piece(Opposition, Soldier, sq(4, 3))
            .update(sq(4, 3), |p| p.set_stance(Stance::Defense));
        let (_, attacks) = tiles_at(&pos, sq(4, 4));
        assert!(!attacks.contains(sq(3, 2)));
        assert!(!attacks.contains(sq(4, 2)));
        assert!(!attacks.contains(sq(5, 2)));
        assert!(attacks.contains(sq(2, 2)));
        assert!(attacks.contains(sq(4, 6)));
    }
    #[test]
    fn test_archer_shadow_diagonal() {
        let pos = Position::empty()
            .with_piece(Challenger, Archer, sq(4, 4))
            .with_piece(Opposition, Soldier, sq(5, 5))
            .update(sq(5, 5), |p| p.set_stance(Stance::Defense));
        let (_, attacks) = tiles_at(&pos, sq(4, 4));
        assert!(!attacks.contains(sq(6, 5)));
        assert!(!attacks.contains(sq(6, 6)));
        assert!(!attacks.contains(sq(5, 6)));
        assert!(attacks.contains(sq(6, 4)));
        assert!(attacks.contains(sq(4, 6)));
    }
    #[test]
    fn test_archer_shadow_scan_stops_at_far_soldier() {
        let pos = Position::empty()
            .with_piece(Challenger, Archer, sq(4, 4))
            .with_piece(Opposition, Soldier, sq(3, 6))
            .with_piece(Opposition, Soldier, sq(5, 4))
            .update(sq(3, 6), |p| p.set_stance(Stance::Defense))
            .update(sq(5, 4), |p| p.set_stance(Stance::Defense));
        let (_, attacks) = tiles_at(&pos, sq(4, 4));
        assert!(attacks.contains(sq(6, 4)));
        assert!(attacks.contains(sq(3, 6)));
    }
    #[test]
    fn test_archer_shadow_scan_continues_past_trailing_soldiers() {
        let pos = Position::empty()
            .with_piece(Challenger, Archer, sq(4, 4))
            .with_piece(Opposition, Soldier, sq(2, 3))
            .with_piece(Opposition, Soldier, sq(4, 5))
            .update(sq(2, 3), |p| p.set_stance(Stance::Defense))
            .update(sq(4, 5), |p| p.set_stance(Stance::Defense));
        let (_, attacks) = tiles_at(&pos, sq(4, 4));
        assert!(!attacks.contains(sq(2, 2)));
        assert!(!attacks.contains(sq(3, 6)));
        assert!(!attacks.contains(sq(4, 6)));
        assert!(!attacks.contains(sq(5, 6)));
        assert!(attacks.contains(sq(4, 5)));
    }
    #[test]
    fn test_archer_shadow_both_soldiers_in_line() {
        let pos = Position::empty()
            .with_piece(Challenger, Archer, sq(4, 4))
            .with_piece(Opposition, Soldier, sq(2, 4))
            .with_piece(Opposition, Soldier, sq(5, 4))
            .update(sq(2, 4), |p| p.set_stance(Stance::Defense))
            .update(sq(5, 4), |p| p.set_stance(Stance::Defense));
        let (_, attacks) = tiles_at(&pos, sq(4, 4));
        assert!(!attacks.contains(sq(6, 4)));
        assert!(attacks.contains(sq(2, 4)));
    }
    #[test]
    fn test_offensive_soldier_casts_no_shadow() {
        let pos = Position::empty()
            .with_piece(Challenger, Archer, sq(4, 4))
            .with_piece(Opposition, Soldier, sq(5, 4));
        let (_, attacks) = tiles_at(&pos, sq(4, 4));
        assert!(attacks.contains(sq(6, 4)));
    }
    #[test]
    fn test_shadow_clipped_to_board() {
        let mask = shadow(sq(1, 0), sq(0, 0));
        assert_eq!(mask.len(), 0);
        let mask = shadow(sq(2, 1), sq(1, 1));
        assert_eq!(mask, Mask::from_squares([sq(0, 0), sq(0, 1), sq(0, 2)]));
    }
    #[test]
    fn test_defending_soldier_has_no_tiles() {
        let pos = Position::empty()
            .with_piece(Challenger, Soldier, sq(4, 4))
            .update(sq(4, 4), |p| p.set_stance(Stance::Defense));
        let (moves, attacks) = tiles_at(&pos, sq(4, 4));
        assert!(moves.is_empty());
        assert!(attacks.is_empty());
        assert!(pos.threat_tiles(pos.id_at(sq(4, 4))).is_empty());
    }
    #[test]
    fn test_offensive_soldier_tiles() {
        let pos = Position::empty()
            .with_piece(Challenger, Soldier, sq(4, 4))
            .with_piece(Opposition, Archer, sq(5, 4));
        let (moves, attacks) = tiles_at(&pos, sq(4, 4));
        assert_eq!(moves.len(), 8);
        assert_eq!(attacks, moves);
        assert!(attacks.contains(sq(5, 4)));
    }
    #[test]
    fn test_general_tiles() {
        let pos = Position::empty()
            .with_piece(Challenger, General, sq(0, 0))
            .with_piece(Challenger, Archer, sq(1, 1));
        let (moves, attacks) = tiles_at(&pos, sq(0, 0));
        assert_eq!(attacks, Mask::from_squares([sq(1, 0), sq(0, 1)]));
        assert!(moves.contains(sq(2, 0)));
        assert!(!moves.contains(sq(1, 1)));
        assert!(!moves.contains(sq(2, 2)));
        assert!(pos.threat_tiles(pos.id_at(sq(0, 0))).is_empty());
    }
    #[test]
    fn test_cannon_line_fire() {
        let pos = Position::empty()
            .with_piece(Challenger, Cannon, sq(4, 4))
            .with_piece(Opposition, Archer, sq(4, 1))
            .with_piece(Challenger, Archer, sq(7, 4));
        let (_, attacks) = tiles_at(&pos, sq(4, 4));
        assert!(attacks.contains(sq(4, 3)));
        assert!(attacks.contains(sq(4, 1)));
        assert!(!attacks.contains(sq(4, 0)));
        assert!(!attacks.contains(sq(5, 4)));
        assert!(!attacks.contains(sq(6, 4)));
        assert!(attacks.contains(sq(0, 4)));
        assert!(attacks.contains(sq(8, 8)));
        assert!(attacks.contains(sq(0, 0)));
    }
    #[test]
    fn test_cannon_moves_avoid_pieces() {
        let pos = Position::empty()
            .with_piece(Challenger, Cannon, sq(4, 4))
            .with_piece(Opposition, Archer, sq(5, 5));
        let (moves, _) = tiles_at(&pos, sq(4, 4));
        assert_eq!(moves.len(), 7);
        assert!(!moves.contains(sq(5, 5)));
    }
    #[test]
    fn test_unready_cannon_has_no_tiles() {
        let pos = Position::empty()
            .with_piece(Challenger, Cannon, sq(4, 4))
            .update(sq(4, 4), |p| p.set_ready(Readiness::Unready));
        let (moves, attacks) = tiles_at(&pos, sq(4, 4));
        assert!(moves.is_empty());
        assert!(attacks.is_empty());
    }
    #[test]
    fn test_intercepting_soldier() {
        let pos = Position::empty()
            .with_piece(Opposition, Soldier, sq(1, 1))
            .with_piece(Opposition, Soldier, sq(2, 1))
            .update(sq(1, 1), |p| p.set_stance(Stance::Defense))
            .update(sq(2, 1), |p| p.set_stance(Stance::Defense));
        let first = pos.id_at(sq(1, 1));
        let second = pos.id_at(sq(2, 1));
        assert_eq!(intercepting_soldier(&pos, sq(0, 0), sq(3, 3), Opposition), Some(first));
        assert_eq!(intercepting_soldier(&pos, sq(0, 0), sq(3, 3), Challenger), None);
        assert_eq!(intercepting_soldier(&pos, sq(0, 1), sq(3, 1), Opposition), Some(first));
        assert_eq!(intercepting_soldier(&pos, sq(4, 1), sq(0, 1), Opposition), Some(second));
        assert_eq!(intercepting_soldier(&pos, sq(0, 0), sq(1, 1), Opposition), None);
    }
}
