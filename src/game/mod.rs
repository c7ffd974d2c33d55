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
use strum_macros::Display;

use crate::Side;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchResult {
    Win(Side, WinReason),
    Draw(DrawReason),
}

impl MatchResult {
    pub fn winner(&self) -> Option<Side> {
        match self {
            MatchResult::Win(side, _) => Some(*side),
            MatchResult::Draw(_) => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WinReason {
    GeneralCaptured,
    Surrendered,
}

#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawReason {
    // The opposition answered the loss of its general by taking the
    // challenger's general on the following turn.
    BothGeneralsCaptured,
}
