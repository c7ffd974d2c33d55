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
use std::hash::{Hash, Hasher};
use std::ops::{Index, IndexMut, Not};
use strum_macros::Display;
use strum_macros::EnumIter;

use Side::{Challenger, Opposition};

#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Side {
    Challenger,
    Opposition,
}

impl Side {
    pub const fn to_index(&self) -> usize {
        *self as usize
    }
}

impl Not for Side {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        match self {
            Challenger => Opposition,
            Opposition => Challenger,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pair<T>((T, T));

impl<T> Pair<T> {
    pub const fn new(challenger: T, opposition: T) -> Self {
        Self((challenger, opposition))
    }
}

impl<T> Pair<T> {
    pub fn challenger(&self) -> &T {
        &self.0 .0
    }
    pub fn challenger_mut(&mut self) -> &mut T {
        &mut self.0 .0
    }
    pub fn opposition(&self) -> &T {
        &self.0 .1
    }
    pub fn opposition_mut(&mut self) -> &mut T {
        &mut self.0 .1
    }
}

impl<T: Hash> Hash for Pair<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.challenger().hash(state);
        self.opposition().hash(state);
    }
}

impl<T> Index<Side> for Pair<T> {
    type Output = T;

    #[inline(always)]
    fn index(&self, index: Side) -> &Self::Output {
        match index {
            Challenger => self.challenger(),
            Opposition => self.opposition(),
        }
    }
}

impl<T> IndexMut<Side> for Pair<T> {
    #[inline(always)]
    fn index_mut(&mut self, index: Side) -> &mut Self::Output {
        match index {
            Challenger => self.challenger_mut(),
            Opposition => self.opposition_mut(),
        }
    }
}

/// The four piece variants, without their per-variant state.
#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Kind {
    Archer,
    Soldier,
    Cannon,
    General,
}

impl Kind {
    /// Position in the per-kind rule tables.
    pub fn to_index(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Stance {
    Offense,
    Defense,
}

impl Not for Stance {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Stance::Offense => Stance::Defense,
            Stance::Defense => Stance::Offense,
        }
    }
}

/// A cannon only acts after two adjacent friendlies have assisted it.
/// `Move` and `Attack` mark a cannon whose assistance is being gathered
/// for that action.
#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Readiness {
    Unready,
    Ready,
    Move,
    Attack,
}

#[cfg(test)]
mod tests {
    use crate::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_side_not() {
        assert_eq!(!Side::Challenger, Side::Opposition);
        assert_eq!(!Side::Opposition, Side::Challenger);
    }
    #[test]
    fn test_pair_index() {
        let mut pair = Pair::new(1, 2);
        pair[Side::Opposition] += 10;
        assert_eq!(pair[Side::Challenger], 1);
        assert_eq!(pair[Side::Opposition], 12);
    }
    #[test]
    fn test_kind_index() {
        for (index, kind) in Kind::iter().enumerate() {
            assert_eq!(kind.to_index(), index);
        }
    }
}
