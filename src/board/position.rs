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
use std::fmt;
use std::ops::Index;

use super::layout::{check_overlap, Layout};
use super::material::{Kind, Pair, Side};
use super::piece::{Piece, PieceId};
use super::play::PlayError;
use super::square::{Mask, Square, CELLS, COLS, ROWS};

/// The board: which piece (if any) sits on each of the 81 cells, plus the
/// arena holding every piece of both sides, captured ones included.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Position {
    cells: [Option<PieceId>; CELLS],
    pieces: Vec<Piece>,
    occupied: Pair<Mask>,
}

impl Position {
    /// Places both layouts on an empty board. Challenger pieces get the
    /// lower ids.
    ///
    /// # Errors
    ///
    /// Returns `LayoutError::Overlap` if the layouts claim a common cell.
    pub fn new(challenger: &Layout, opposition: &Layout) -> Result<Self> {
        check_overlap(challenger, opposition)?;
        Ok(Self::from_layouts(challenger, opposition))
    }

    /// Like `new` for layouts already known not to overlap.
    pub(crate) fn from_layouts(challenger: &Layout, opposition: &Layout) -> Self {
        debug_assert!(check_overlap(challenger, opposition).is_ok());
        let mut position = Self::blank();
        for (side, layout) in [(Side::Challenger, challenger), (Side::Opposition, opposition)] {
            for (square, kind) in layout.placements() {
                position.place(side, *kind, *square);
            }
        }
        position
    }

    fn blank() -> Self {
        Self {
            cells: [None; CELLS],
            pieces: Vec::new(),
            occupied: Pair::default(),
        }
    }

    fn place(&mut self, side: Side, kind: Kind, square: Square) -> PieceId {
        debug_assert!(self.cells[square].is_none());
        let id = PieceId::new(self.pieces.len());
        self.pieces.push(Piece::new(id, side, kind, square));
        self.cells[square] = Some(id);
        self.occupied[side].set(square);
        id
    }

    /// Validates an externally supplied piece index.
    ///
    /// # Errors
    ///
    /// Returns `PlayError::InvalidArgument` if no piece has that index.
    pub fn piece_id(&self, index: usize) -> Result<PieceId> {
        if index >= self.pieces.len() {
            return Err(PlayError::InvalidArgument("piece index out of range").into());
        }
        Ok(PieceId::new(index))
    }

    #[inline]
    pub(crate) fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.to_index()]
    }

    #[inline]
    pub(crate) fn piece_mut(&mut self, id: PieceId) -> &mut Piece {
        &mut self.pieces[id.to_index()]
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Mutable access that cannot move pieces between cells.
    pub(crate) fn pieces_mut(&mut self) -> impl Iterator<Item = &mut Piece> {
        self.pieces.iter_mut()
    }

    /// Moves a piece onto an empty cell.
    pub(crate) fn relocate(&mut self, id: PieceId, to: Square) {
        let piece = &self.pieces[id.to_index()];
        let side = piece.side();
        debug_assert!(self.cells[to].is_none());
        if let Some(from) = piece.square() {
            self.cells[from] = None;
            self.occupied[side].reset(from);
        }
        self.cells[to] = Some(id);
        self.occupied[side].set(to);
        self.pieces[id.to_index()].set_square(Some(to));
        self.debug_check();
    }

    /// Takes a piece off the board. Returns the cell it occupied.
    pub(crate) fn remove(&mut self, id: PieceId) -> Option<Square> {
        let piece = &self.pieces[id.to_index()];
        let side = piece.side();
        let square = piece.square()?;
        self.cells[square] = None;
        self.occupied[side].reset(square);
        self.pieces[id.to_index()].set_square(None);
        self.debug_check();
        Some(square)
    }

    #[inline]
    fn debug_check(&self) {
        debug_assert!(self.pieces.iter().all(|piece| match piece.square() {
            Some(square) => self.cells[square] == Some(piece.id()),
            None => !self.cells.contains(&Some(piece.id())),
        }));
    }
}

impl Index<Square> for Position {
    type Output = Option<PieceId>;
    fn index(&self, index: Square) -> &Self::Output {
        &self.cells[index]
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..ROWS {
            for col in 0..COLS {
                let glyph = match self.contents(Square::new(col, row)) {
                    None => '.',
                    Some(piece) => {
                        let glyph = match piece.kind() {
                            Kind::Archer => 'a',
                            Kind::Soldier => 's',
                            Kind::Cannon => 'c',
                            Kind::General => 'g',
                        };
                        match piece.side() {
                            Side::Challenger => glyph.to_ascii_uppercase(),
                            Side::Opposition => glyph,
                        }
                    }
                };
                write!(f, "{}", glyph)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl AsRef<Position> for Position {
    fn as_ref(&self) -> &Position {
        self
    }
}

impl Pos for Position {}

/// Read-only board queries shared by everything that owns a position.
pub trait Pos: AsRef<Position> {
    #[inline]
    fn contents(&self, square: Square) -> Option<&Piece> {
        let pos: &Position = self.as_ref();
        pos.cells[square].map(|id| pos.piece(id))
    }
    #[inline]
    fn occupied_by(&self, side: Side) -> Mask {
        let pos: &Position = self.as_ref();
        pos.occupied[side]
    }
    #[inline]
    fn occupied(&self) -> Mask {
        self.occupied_by(Side::Challenger) | self.occupied_by(Side::Opposition)
    }
    #[inline]
    fn is_empty(&self, square: Square) -> bool {
        !self.occupied().contains(square)
    }
    fn pieces_of(&self, side: Side) -> Vec<&Piece> {
        let pos: &Position = self.as_ref();
        pos.pieces.iter().filter(|piece| piece.side() == side).collect()
    }
    fn general(&self, side: Side) -> Option<&Piece> {
        let pos: &Position = self.as_ref();
        pos.pieces
            .iter()
            .find(|piece| piece.side() == side && piece.kind() == Kind::General)
    }
}

#[cfg(test)]
impl Position {
    pub fn empty() -> Self {
        Self::blank()
    }
    pub fn with_piece(mut self, side: Side, kind: Kind, square: Square) -> Self {
        self.place(side, kind, square);
        self
    }
    pub fn update<F>(mut self, square: Square, f: F) -> Self
    where
        F: FnOnce(Piece) -> Piece,
    {
        if let Some(id) = self.cells[square] {
            let piece = self.pieces[id.to_index()].clone();
            self.pieces[id.to_index()] = f(piece);
        }
        self
    }
    pub fn id_at(&self, square: Square) -> PieceId {
        self.cells[square].expect("no piece at square")
    }
}

#[cfg(test)]
mod tests {
    use crate::*;

    fn standard() -> Position {
        Position::new(
            Layout::lookup(Side::Challenger, Formation::Attack),
            Layout::lookup(Side::Opposition, Formation::Attack),
        )
        .unwrap()
    }

    #[test]
    fn test_standard_position() {
        let pos = standard();
        assert_eq!(pos.pieces().len(), 14);
        assert_eq!(pos.occupied_by(Side::Challenger).len(), 7);
        assert_eq!(pos.occupied_by(Side::Opposition).len(), 7);
        let general = pos.contents(Square::from_index(36)).unwrap();
        assert_eq!(general.kind(), Kind::General);
        assert_eq!(general.side(), Side::Challenger);
        assert_eq!(pos.general(Side::Opposition).unwrap().square(), Some(Square::from_index(44)));
    }
    #[test]
    fn test_cells_and_pieces_agree() {
        let pos = standard();
        for piece in pos.pieces() {
            let square = piece.square().unwrap();
            assert_eq!(pos[square], Some(piece.id()));
        }
    }
    #[test]
    fn test_relocate_and_remove() {
        let mut pos = Position::empty().with_piece(Side::Challenger, Kind::Archer, Square::new(0, 0));
        let id = pos.id_at(Square::new(0, 0));
        pos.relocate(id, Square::new(2, 2));
        assert!(pos.is_empty(Square::new(0, 0)));
        assert_eq!(pos[Square::new(2, 2)], Some(id));
        assert!(pos.occupied_by(Side::Challenger).contains(Square::new(2, 2)));
        assert_eq!(pos.remove(id), Some(Square::new(2, 2)));
        assert_eq!(pos.piece(id).square(), None);
        assert!(pos.occupied().is_empty());
        assert_eq!(pos.remove(id), None);
    }
    #[test]
    fn test_piece_id_range() {
        let pos = standard();
        assert!(pos.piece_id(13).is_ok());
        let err = pos.piece_id(14).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlayError>(),
            Some(PlayError::InvalidArgument(_))
        ));
    }
    #[test]
    fn test_overlapping_layouts_rejected() {
        let a = Layout::build([(3, Kind::General), (4, Kind::Cannon)]).unwrap();
        assert!(Position::new(&a, &a).is_err());
    }
}
