//! Game states the soundtrack reacts to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    Menu,
    Shop,
    Roster,
    Countdown,
    Playing,
    Paused,
    Finished,
    Replay,
    Paywall,
}

/// Soundtrack mood for a game state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ambience {
    /// Open filter, fast LFO, beat running
    Racing,
    /// Closed filter, slow LFO, no beat
    Halted,
    /// Menus and everything else
    Idle,
}

impl GameState {
    pub const ALL: [GameState; 9] = [
        Self::Menu,
        Self::Shop,
        Self::Roster,
        Self::Countdown,
        Self::Playing,
        Self::Paused,
        Self::Finished,
        Self::Replay,
        Self::Paywall,
    ];

    pub fn ambience(self) -> Ambience {
        match self {
            Self::Playing | Self::Countdown => Ambience::Racing,
            Self::Finished | Self::Paused => Ambience::Halted,
            _ => Ambience::Idle,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Menu => "MENU",
            Self::Shop => "SHOP",
            Self::Roster => "ROSTER",
            Self::Countdown => "COUNTDOWN",
            Self::Playing => "PLAYING",
            Self::Paused => "PAUSED",
            Self::Finished => "FINISHED",
            Self::Replay => "REPLAY",
            Self::Paywall => "PAYWALL",
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("Unknown game state: {}", s))
    }
}
