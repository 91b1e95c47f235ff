//! Game entities as the server describes them on the wire.
//!
//! These types are read-only mirrors of what the game engine pushes. The
//! client never computes them; it only decodes, stores and reads them.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Chips a player brings to the table when no amount is given.
pub const DEFAULT_CHIPS: i64 = 1000;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Suit {
    Spade,
    Heart,
    Diamond,
    Club,
}

impl Suit {
    /// Numeric suit code used by the server: 0 spades, 1 hearts,
    /// 2 diamonds, 3 clubs.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Spade),
            1 => Some(Self::Heart),
            2 => Some(Self::Diamond),
            3 => Some(Self::Club),
            _ => None,
        }
    }

    /// Resolve a suit from the display name the server attaches to a card.
    ///
    /// The reference server names suits in Chinese; English names, single
    /// letters and suit symbols are accepted too.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        match name {
            "黑桃" | "♠" => return Some(Self::Spade),
            "红桃" | "♥" => return Some(Self::Heart),
            "方块" | "♦" => return Some(Self::Diamond),
            "梅花" | "♣" => return Some(Self::Club),
            _ => {}
        }
        match name.to_ascii_lowercase().as_str() {
            "s" | "spade" | "spades" => Some(Self::Spade),
            "h" | "heart" | "hearts" => Some(Self::Heart),
            "d" | "diamond" | "diamonds" => Some(Self::Diamond),
            "c" | "club" | "clubs" => Some(Self::Club),
            _ => None,
        }
    }

    pub fn color(self) -> CardColor {
        match self {
            Self::Heart | Self::Diamond => CardColor::Red,
            Self::Spade | Self::Club => CardColor::Black,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Spade => "♠",
            Self::Heart => "♥",
            Self::Diamond => "♦",
            Self::Club => "♣",
        };
        write!(f, "{repr}")
    }
}

/// Presentation color of a card.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CardColor {
    Red,
    Black,
}

/// A card as sent by the server.
///
/// The server sends both numeric codes and pre-rendered names. Only the
/// fields needed for presentation are interpreted; everything else is kept
/// verbatim.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Card {
    pub suit: Option<u8>,
    pub rank: u8,
    pub suit_name: String,
    pub rank_name: String,
    pub display: String,
    pub short_display: String,
}

impl Card {
    /// Red for hearts and diamonds, black otherwise.
    ///
    /// The color follows the suit *name*. The numeric code is consulted only
    /// when the name is not one we recognize.
    pub fn color(&self) -> CardColor {
        Suit::from_name(&self.suit_name)
            .or_else(|| self.suit.and_then(Suit::from_code))
            .map_or(CardColor::Black, Suit::color)
    }

    pub fn is_red(&self) -> bool {
        self.color() == CardColor::Red
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !self.display.is_empty() {
            return write!(f, "{}", self.display);
        }
        let value = match self.rank {
            1 | 14 => "A".to_string(),
            11 => "J".to_string(),
            12 => "Q".to_string(),
            13 => "K".to_string(),
            v @ 2..=10 => v.to_string(),
            _ => "?".to_string(),
        };
        match self.suit.and_then(Suit::from_code) {
            Some(suit) => write!(f, "{value}{suit}"),
            None => write!(f, "{value}"),
        }
    }
}

/// Betting phase of the current deal.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    Waiting,
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "waiting",
            Self::PreFlop => "pre-flop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// The last action a player took, as reported by the server.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LastAction {
    Fold,
    Check,
    Call,
    Raise,
    AllIn,
}

impl fmt::Display for LastAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Fold => "folded",
            Self::Check => "checked",
            Self::Call => "called",
            Self::Raise => "raised",
            Self::AllIn => "all-in",
        };
        write!(f, "{repr}")
    }
}

/// A seated player.
///
/// `hole_cards` is only populated for the local player (or for everyone at
/// showdown); other players arrive with an empty list.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub chips: i64,
    pub current_bet: i64,
    pub in_game: bool,
    pub is_ai: bool,
    pub has_folded: bool,
    pub is_all_in: bool,
    pub is_dealer: bool,
    pub is_small_blind: bool,
    pub is_big_blind: bool,
    pub hole_cards: Vec<Card>,
    pub last_action: Option<LastAction>,
}

impl Player {
    /// Short status shown next to a player's name.
    pub fn status_label(&self) -> String {
        if self.has_folded {
            "folded".to_string()
        } else if self.is_all_in {
            "all-in".to_string()
        } else if let Some(action) = self.last_action {
            action.to_string()
        } else {
            "waiting".to_string()
        }
    }

    /// Dealer and blind badges, e.g. `["D", "SB"]`.
    pub fn badges(&self) -> Vec<&'static str> {
        let mut badges = Vec::new();
        if self.is_dealer {
            badges.push("D");
        }
        if self.is_small_blind {
            badges.push("SB");
        }
        if self.is_big_blind {
            badges.push("BB");
        }
        badges
    }
}

/// The authoritative game state pushed by the server.
///
/// A snapshot is never patched. Each `gameState` frame produces a new value
/// that replaces the previous one.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSnapshot {
    pub pot: i64,
    #[serde(rename = "currentPhase")]
    pub phase: Phase,
    pub players: Vec<Player>,
    pub community_cards: Vec<Card>,
    pub current_player: Option<Player>,
    #[serde(rename = "currentBetAmount", alias = "currentBet")]
    pub current_bet: i64,
    #[serde(rename = "isAutoGameRunning")]
    pub auto_game_running: Option<bool>,
}

impl GameSnapshot {
    /// Id of the player entitled to act, if any.
    pub fn acting_player_id(&self) -> Option<&str> {
        self.current_player.as_ref().map(|player| player.id.as_str())
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }
}

/// Player actions accepted by the server during a betting round.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Raise,
    AllIn,
}

impl ActionKind {
    pub fn requires_amount(self) -> bool {
        self == Self::Raise
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Fold => "fold",
            Self::Check => "check",
            Self::Call => "call",
            Self::Raise => "raise",
            Self::AllIn => "allin",
        };
        write!(f, "{repr}")
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fold" => Ok(Self::Fold),
            "check" => Ok(Self::Check),
            "call" => Ok(Self::Call),
            "raise" => Ok(Self::Raise),
            "allin" | "all-in" | "all_in" => Ok(Self::AllIn),
            other => Err(format!("unknown action '{other}'")),
        }
    }
}
