use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: u32,
    pub name: String,
    pub abbr: String,
}

/// Contest-level facts copied into every record. Never read by a classifier.
///
/// `venue`, `attendance` and `scheduled` are `None` when the box score page
/// did not report them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestMeta {
    pub contest_id: u64,
    pub season: u16,
    pub home: TeamRef,
    pub away: TeamRef,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub attendance: Option<u32>,
    #[serde(default)]
    pub scheduled: Option<DateTime<FixedOffset>>,
}

impl ContestMeta {
    pub fn team(&self, side: Side) -> &TeamRef {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePair {
    pub home: u16,
    pub away: u16,
}

impl ScorePair {
    pub fn new(home: u16, away: u16) -> Self {
        Self { home, away }
    }

    /// Parses the box score column, which lists the away score first.
    pub fn parse_away_home(raw: &str) -> Option<Self> {
        let (away, home) = raw.trim().split_once('-')?;
        let away = away.trim().parse::<u16>().ok()?;
        let home = home.trim().parse::<u16>().ok()?;
        Some(Self { home, away })
    }

    pub fn get(&self, side: Side) -> u16 {
        match side {
            Side::Home => self.home,
            Side::Away => self.away,
        }
    }
}

/// One line of contest text plus the positional context the caller knows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPlay {
    pub sequence: u32,
    pub period: u8,
    /// Possessing side in football, acting side in volleyball.
    pub side: Side,
    pub text: String,
    /// Football down and distance, e.g. `1st & 10 at UNC25`.
    #[serde(default)]
    pub situation: Option<String>,
    /// Time left in the period as `MM:SS`.
    #[serde(default)]
    pub clock: Option<String>,
    /// Volleyball set score after the rally.
    #[serde(default)]
    pub score: Option<ScorePair>,
}

impl RawPlay {
    pub fn new(sequence: u32, period: u8, side: Side, text: impl Into<String>) -> Self {
        Self {
            sequence,
            period,
            side,
            text: text.into(),
            situation: None,
            clock: None,
            score: None,
        }
    }

    pub fn with_situation(mut self, situation: impl Into<String>) -> Self {
        self.situation = Some(situation.into());
        self
    }

    pub fn with_score(mut self, score: ScorePair) -> Self {
        self.score = Some(score);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contest {
    pub meta: Arc<ContestMeta>,
    pub plays: Vec<RawPlay>,
}

/// Ordered secondary participants on a play, at most two.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Participants(Vec<String>);

impl Participants {
    pub const MAX: usize = 2;

    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Splits `A; B` style credit lists. Returns `None` past the maximum.
    pub fn from_list(raw: &str, separator: char) -> Option<Self> {
        let mut out = Self::new();
        for name in raw.split(separator).map(str::trim).filter(|n| !n.is_empty()) {
            if !out.push(name) {
                return None;
            }
        }
        Some(out)
    }

    pub fn push(&mut self, name: &str) -> bool {
        if self.0.len() >= Self::MAX {
            return false;
        }
        self.0.push(name.to_string());
        true
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn second(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Two names means shared credit: an assisted tackle or a half sack.
    pub fn is_shared(&self) -> bool {
        self.0.len() == Self::MAX
    }
}

/// Output for one `RawPlay`. Emitted once and never revised.
#[derive(Debug, Clone, Serialize)]
pub struct PlayRecord<K, F, S> {
    pub sequence: u32,
    pub kind: K,
    pub rule: &'static str,
    pub fields: F,
    pub pre: S,
    pub post: S,
    pub meta: Arc<ContestMeta>,
}
