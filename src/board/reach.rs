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

use super::square::{Direction, Mask, Square};

/// Cells a path may not cross. `friendly` cells are never entered, `enemy`
/// cells may only be the starting cell of the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Obstacles {
    pub friendly: Mask,
    pub enemy: Mask,
}

/// Bounded depth-first search over king steps. Returns whether `to` can be
/// reached from `from` in at most `moves_remaining` steps without crossing
/// an obstacle.
///
/// Callers search from the candidate destination back toward the moving
/// piece with `initial` set, so an enemy on the destination itself does not
/// block the path while enemies on intermediate cells do.
pub fn can_reach(
    from: Square,
    to: Square,
    obstacles: &Obstacles,
    moves_remaining: isize,
    initial: bool,
) -> bool {
    if moves_remaining < 0 {
        return false;
    }
    if from == to {
        return true;
    }
    if from.distance(to) as isize > moves_remaining {
        return false;
    }
    if obstacles.friendly.contains(from) {
        return false;
    }
    if obstacles.enemy.contains(from) && !initial {
        return false;
    }
    Direction::iter()
        .filter_map(|dir| from + dir)
        .any(|next| can_reach(next, to, obstacles, moves_remaining - 1, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> Obstacles {
        Obstacles {
            friendly: Mask::empty(),
            enemy: Mask::empty(),
        }
    }

    #[test]
    fn test_same_cell_with_zero_budget() {
        let square = Square::new(3, 3);
        assert!(can_reach(square, square, &open(), 0, true));
        assert!(!can_reach(square, square, &open(), -1, true));
    }
    #[test]
    fn test_distance_beyond_budget() {
        assert!(!can_reach(Square::new(0, 0), Square::new(3, 0), &open(), 2, true));
        assert!(can_reach(Square::new(0, 0), Square::new(2, 2), &open(), 2, true));
    }
    #[test]
    fn test_enemy_destination_is_reachable() {
        let obstacles = Obstacles {
            friendly: Mask::empty(),
            enemy: Square::new(2, 0).to_mask(),
        };
        assert!(can_reach(Square::new(2, 0), Square::new(0, 0), &obstacles, 2, true));
        assert!(!can_reach(Square::new(2, 0), Square::new(0, 0), &obstacles, 2, false));
    }
    #[test]
    fn test_wall_of_enemies_blocks() {
        // Column 1 filled with enemies between (0,4) and (2,4).
        let wall = Mask::from_squares((0..9).map(|row| Square::new(1, row)));
        let obstacles = Obstacles {
            friendly: Mask::empty(),
            enemy: wall,
        };
        assert!(!can_reach(Square::new(2, 4), Square::new(0, 4), &obstacles, 2, true));
    }
    #[test]
    fn test_path_around_friendly() {
        let obstacles = Obstacles {
            friendly: Square::new(1, 0).to_mask(),
            enemy: Mask::empty(),
        };
        assert!(can_reach(Square::new(2, 0), Square::new(0, 0), &obstacles, 2, true));
        assert!(!can_reach(Square::new(1, 0), Square::new(0, 0), &obstacles, 2, true));
    }
}
