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
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, BitAnd, BitAndAssign, BitOr, BitOrAssign, Not, Sub};
use std::ops::{Index, IndexMut};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use super::play::PlayError;

pub const COLS: usize = 9;
pub const ROWS: usize = 9;
pub const CELLS: usize = COLS * ROWS;

/// A single cell of the 9x9 board, stored as `row * 9 + col`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct Square(u8);

impl Square {
    #[inline]
    pub(crate) const fn new(col: usize, row: usize) -> Self {
        debug_assert!(col < COLS && row < ROWS);
        Self((row * COLS + col) as u8)
    }

    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        debug_assert!(index < CELLS);
        Self(index as u8)
    }

    /// Validates an externally supplied cell index.
    ///
    /// # Errors
    ///
    /// Returns `PlayError::InvalidArgument` if `index` is not in `0..81`.
    pub fn try_from_index(index: usize) -> Result<Self> {
        if index >= CELLS {
            return Err(PlayError::InvalidArgument("cell index out of range").into());
        }
        Ok(Self(index as u8))
    }

    #[inline]
    pub fn try_new(col: isize, row: isize) -> Option<Self> {
        if (0..COLS as isize).contains(&col) && (0..ROWS as isize).contains(&row) {
            Some(Self::new(col as usize, row as usize))
        } else {
            None
        }
    }

    #[inline]
    pub const fn to_index(&self) -> usize {
        self.0 as usize
    }
    #[inline]
    pub const fn to_mask(&self) -> Mask {
        Mask::new(0x1 << self.0)
    }
    #[inline]
    pub const fn col(&self) -> usize {
        self.to_index() % COLS
    }
    #[inline]
    pub const fn row(&self) -> usize {
        self.to_index() / COLS
    }

    /// Chebyshev distance, i.e. the number of king steps between two cells.
    #[inline]
    pub fn distance(&self, other: Square) -> usize {
        let offset = other - *self;
        offset.chebyshev()
    }

    pub fn iter() -> impl DoubleEndedIterator<Item = Square> {
        (0..CELLS).map(Self::from_index)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.col(), self.row())
    }
}

impl From<Square> for usize {
    fn from(value: Square) -> Self {
        value.to_index()
    }
}

impl From<Square> for u8 {
    fn from(value: Square) -> Self {
        value.0
    }
}

impl TryFrom<u8> for Square {
    type Error = PlayError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value as usize >= CELLS {
            return Err(PlayError::InvalidArgument("cell index out of range"));
        }
        Ok(Self(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Offset {
    pub x: isize,
    pub y: isize,
}

impl Offset {
    pub const fn new(x: isize, y: isize) -> Self {
        Self { x, y }
    }

    pub fn chebyshev(&self) -> usize {
        self.x.unsigned_abs().max(self.y.unsigned_abs())
    }

    pub fn signum(self) -> Self {
        Self::new(self.x.signum(), self.y.signum())
    }
}

impl Add<Offset> for Square {
    type Output = Option<Square>;
    fn add(self, rhs: Offset) -> Self::Output {
        Square::try_new(self.col() as isize + rhs.x, self.row() as isize + rhs.y)
    }
}

impl Add<&Offset> for Square {
    type Output = Option<Square>;
    fn add(self, rhs: &Offset) -> Self::Output {
        self + *rhs
    }
}

impl Sub for Square {
    type Output = Offset;
    fn sub(self, rhs: Self) -> Self::Output {
        Offset::new(
            self.col() as isize - rhs.col() as isize,
            self.row() as isize - rhs.row() as isize,
        )
    }
}

impl<T> Index<Square> for [T; CELLS] {
    type Output = T;
    fn index(&self, square: Square) -> &Self::Output {
        &self[square.to_index()]
    }
}

impl<T> IndexMut<Square> for [T; CELLS] {
    fn index_mut(&mut self, square: Square) -> &mut Self::Output {
        &mut self[square.to_index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Direction {
    UpLeft,
    Up,
    UpRight,
    Left,
    Right,
    DownLeft,
    Down,
    DownRight,
}

use Direction::{Down, DownLeft, DownRight, Left, Right, Up, UpLeft, UpRight};

impl From<Direction> for Offset {
    fn from(value: Direction) -> Self {
        match value {
            UpLeft => Self::new(-1, -1),
            Up => Self::new(0, -1),
            UpRight => Self::new(1, -1),
            Left => Self::new(-1, 0),
            Right => Self::new(1, 0),
            DownLeft => Self::new(-1, 1),
            Down => Self::new(0, 1),
            DownRight => Self::new(1, 1),
        }
    }
}

impl Add<Direction> for Square {
    type Output = Option<Square>;
    fn add(self, rhs: Direction) -> Self::Output {
        let offset: Offset = rhs.into();
        self + offset
    }
}

const BOARD_BITS: u128 = (1 << CELLS) - 1;

/// A set of cells. Bit `i` stands for the cell with index `i`.
#[derive(Clone, Serialize, Deserialize, Copy, PartialEq, Eq, Hash, Default)]
#[serde(from = "u128")]
pub struct Mask(u128);

impl Mask {
    #[inline]
    pub const fn new(val: u128) -> Self {
        Self(val & BOARD_BITS)
    }

    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn all() -> Self {
        Self(BOARD_BITS)
    }

    pub fn from_squares<I>(squares: I) -> Self
    where
        I: IntoIterator<Item = Square>,
    {
        squares
            .into_iter()
            .map(|square| square.to_mask())
            .reduce(|m1, m2| m1 | m2)
            .unwrap_or_default()
    }

    /// Every cell within Chebyshev distance `range` of `center`, the
    /// center included.
    pub fn within(center: Square, range: usize) -> Self {
        let range = range as isize;
        let mut mask = Self::empty();
        for dc in -range..=range {
            for dr in -range..=range {
                if let Some(square) = center + Offset::new(dc, dr) {
                    mask.set(square);
                }
            }
        }
        mask
    }

    #[inline]
    pub(crate) const fn inner(&self) -> u128 {
        self.0
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub const fn get(&self, square: Square) -> bool {
        (self.0 & square.to_mask().0) != 0
    }

    #[inline]
    pub fn set(&mut self, square: Square) {
        self.0 |= square.to_mask().0;
    }

    #[inline]
    pub fn reset(&mut self, square: Square) {
        self.0 &= !square.to_mask().0;
    }

    #[inline]
    pub const fn contains(&self, square: Square) -> bool {
        self.get(square)
    }

    pub fn iter(&self) -> MaskIter {
        MaskIter(self.0)
    }
}

impl From<u128> for Mask {
    fn from(value: u128) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..ROWS {
            for col in 0..COLS {
                let square = Square::new(col, row);
                write!(f, "{}", if self.get(square) { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl IntoIterator for Mask {
    type Item = Square;
    type IntoIter = MaskIter;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Square> for Mask {
    fn from_iter<I: IntoIterator<Item = Square>>(iter: I) -> Self {
        Self::from_squares(iter)
    }
}

impl Sub<Square> for Mask {
    type Output = Self;
    fn sub(self, rhs: Square) -> Self::Output {
        Self(self.0 & !rhs.to_mask().inner())
    }
}

impl Sub for Mask {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 & !rhs.0)
    }
}

impl Not for Mask {
    type Output = Self;
    fn not(self) -> Self::Output {
        Self(!self.0 & BOARD_BITS)
    }
}

impl BitOr for Mask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Mask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitOr<Square> for Mask {
    type Output = Self;

    fn bitor(self, rhs: Square) -> Self {
        Self(self.0 | rhs.to_mask().0)
    }
}

impl BitOrAssign<Square> for Mask {
    fn bitor_assign(&mut self, rhs: Square) {
        self.0 |= rhs.to_mask().0;
    }
}

impl BitAnd for Mask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for Mask {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaskIter(u128);

impl MaskIter {
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }
}

impl Iterator for MaskIter {
    type Item = Square;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0 != 0 {
            let square = Square::from_index(self.0.trailing_zeros() as usize);
            self.0 &= !square.to_mask().inner();
            return Some(square);
        }
        None
    }
}

impl DoubleEndedIterator for MaskIter {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.0 != 0 {
            let square = Square::from_index(127 - self.0.leading_zeros() as usize);
            self.0 &= !square.to_mask().inner();
            return Some(square);
        }
        None
    }
}

/// The 8-neighbourhood of every cell.
pub static NEIGHBORS: Lazy<[Mask; CELLS]> = Lazy::new(|| {
    let mut array = [Mask::default(); CELLS];
    for square in Square::iter() {
        array[square] = Mask::from_squares(Direction::iter().filter_map(|dir| square + dir));
    }
    array
});

#[cfg(test)]
mod tests {
    use crate::*;

    #[test]
    fn test_index_round_trip() {
        let square = Square::new(4, 7);
        assert_eq!(square.to_index(), 67);
        assert_eq!(square.col(), 4);
        assert_eq!(square.row(), 7);
        assert_eq!(Square::from_index(67), square);
    }
    #[test]
    fn test_try_from_index_rejects_out_of_range() {
        assert!(Square::try_from_index(80).is_ok());
        let err = Square::try_from_index(81).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlayError>(),
            Some(PlayError::InvalidArgument(_))
        ));
    }
    #[test]
    fn test_checked_constructors_reject_off_board() {
        assert_eq!(Square::try_new(9, 0), None);
        assert_eq!(Square::try_new(-1, 4), None);
        assert_eq!(Square::try_new(8, 0).map(|square| square.to_index()), Some(8));
        assert_eq!(Square::try_from(9u8).ok(), Square::try_new(0, 1));
        assert_eq!(Square::try_from(81u8), Err(PlayError::InvalidArgument("cell index out of range")));
    }
    #[test]
    fn test_mask_from_raw_bits_stays_on_board() {
        assert_eq!(Mask::from(u128::MAX), Mask::all());
        assert_eq!(Mask::from(u128::MAX).iter().next_back(), Some(Square::new(8, 8)));
    }
    #[test]
    fn test_distance_is_chebyshev() {
        let a = Square::new(1, 1);
        assert_eq!(a.distance(Square::new(3, 2)), 2);
        assert_eq!(a.distance(Square::new(0, 0)), 1);
        assert_eq!(a.distance(a), 0);
    }
    #[test]
    fn test_offset_off_board() {
        let corner = Square::new(0, 0);
        assert_eq!(corner + Direction::UpLeft, None);
        assert_eq!(corner + Direction::DownRight, Some(Square::new(1, 1)));
        assert_eq!(Square::new(8, 4) + Offset::new(1, 0), None);
    }
    #[test]
    fn test_mask_iter_ascending() {
        let mask = Mask::from_squares([Square::new(8, 8), Square::new(0, 0), Square::new(3, 4)]);
        let squares: Vec<Square> = mask.iter().collect();
        assert_eq!(squares, vec![Square::new(0, 0), Square::new(3, 4), Square::new(8, 8)]);
        assert_eq!(mask.iter().next_back(), Some(Square::new(8, 8)));
    }
    #[test]
    fn test_mask_not_stays_on_board() {
        assert_eq!((!Mask::empty()).len(), CELLS);
        assert!((!Mask::all()).is_empty());
    }
    #[test]
    fn test_within_clips_to_board() {
        assert_eq!(Mask::within(Square::new(4, 4), 1).len(), 9);
        assert_eq!(Mask::within(Square::new(0, 0), 2).len(), 9);
        assert_eq!(Mask::within(Square::new(4, 4), 2).len(), 25);
    }
    #[test]
    fn test_neighbors() {
        assert_eq!(NEIGHBORS[Square::new(0, 0)].len(), 3);
        assert_eq!(NEIGHBORS[Square::new(4, 0)].len(), 5);
        assert_eq!(NEIGHBORS[Square::new(4, 4)].len(), 8);
        assert!(!NEIGHBORS[Square::new(4, 4)].contains(Square::new(4, 4)));
    }
}
