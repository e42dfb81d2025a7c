use regex::Captures;
use serde::Serialize;

use crate::error::FieldError;
use crate::play::Participants;
use crate::rules::{opt_owned, opt_text, text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubDirection {
    In,
    Out,
    /// A `TEAM subs:` line swaps players both ways.
    Swap,
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Substitution {
    pub direction: SubDirection,
    pub players: Vec<String>,
}

impl Substitution {
    pub const MAX_PLAYERS: usize = 4;
}

/// Fields pulled from one volleyball line. `None` means the line's form does
/// not name that participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VolleyballFields {
    pub player: Option<String>,
    /// Setter credited on a kill, `Kill by A (from B)`.
    pub assist: Option<String>,
    /// Team named by a `Point TEAM:` prefix.
    pub point_team: Option<String>,
    /// Timeout, lineup, substitution or challenge team.
    pub team: Option<String>,
    /// The parenthesised type in `attack(type)`, `set(type)` and similar.
    pub action_type: Option<String>,
    pub blockers: Participants,
    pub substitution: Option<Substitution>,
    pub lineup: Vec<String>,
    pub first_ball: bool,
}

pub(crate) fn none(_: &Captures<'_>, _: &()) -> Result<VolleyballFields, FieldError> {
    Ok(VolleyballFields::default())
}

pub(crate) fn team_line(caps: &Captures<'_>, _: &()) -> Result<VolleyballFields, FieldError> {
    Ok(VolleyballFields {
        team: opt_owned(caps, "team"),
        ..Default::default()
    })
}

pub(crate) fn timeout(caps: &Captures<'_>, _: &()) -> Result<VolleyballFields, FieldError> {
    Ok(VolleyballFields {
        team: Some(text(caps, "team")?.to_string()),
        ..Default::default()
    })
}

pub(crate) fn lineup(caps: &Captures<'_>, _: &()) -> Result<VolleyballFields, FieldError> {
    let lineup: Vec<String> = text(caps, "players")?
        .split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    Ok(VolleyballFields {
        team: Some(text(caps, "team")?.to_string()),
        lineup,
        ..Default::default()
    })
}

fn single_sub(caps: &Captures<'_>, direction: SubDirection) -> Result<VolleyballFields, FieldError> {
    Ok(VolleyballFields {
        substitution: Some(Substitution {
            direction,
            players: vec![text(caps, "players")?.to_string()],
        }),
        ..Default::default()
    })
}

pub(crate) fn sub_in(caps: &Captures<'_>, _: &()) -> Result<VolleyballFields, FieldError> {
    single_sub(caps, SubDirection::In)
}

pub(crate) fn sub_out(caps: &Captures<'_>, _: &()) -> Result<VolleyballFields, FieldError> {
    single_sub(caps, SubDirection::Out)
}

pub(crate) fn sub_by(caps: &Captures<'_>, _: &()) -> Result<VolleyballFields, FieldError> {
    single_sub(caps, SubDirection::Unspecified)
}

/// `TEAM subs: A,B C,D.` Names carry their own commas, so a list containing
/// commas is split on spaces.
pub(crate) fn team_subs(caps: &Captures<'_>, _: &()) -> Result<VolleyballFields, FieldError> {
    let raw = text(caps, "players")?;
    let players: Vec<String> = if raw.contains(',') {
        raw.split_whitespace().map(str::to_string).collect()
    } else {
        vec![raw.to_string()]
    };
    if players.len() > Substitution::MAX_PLAYERS {
        return Err(FieldError::Shape(format!(
            "{} players in one substitution: `{raw}`",
            players.len()
        )));
    }
    Ok(VolleyballFields {
        team: Some(text(caps, "team")?.to_string()),
        substitution: Some(Substitution {
            direction: SubDirection::Swap,
            players,
        }),
        ..Default::default()
    })
}

pub(crate) fn player(caps: &Captures<'_>, _: &()) -> Result<VolleyballFields, FieldError> {
    Ok(VolleyballFields {
        player: Some(text(caps, "player")?.to_string()),
        assist: opt_owned(caps, "assist"),
        point_team: opt_owned(caps, "point_team"),
        action_type: opt_text(caps, "action").map(str::to_lowercase),
        ..Default::default()
    })
}

/// `Point TEAM: (X) ...` credits the server named in parentheses.
pub(crate) fn server(caps: &Captures<'_>, _: &()) -> Result<VolleyballFields, FieldError> {
    Ok(VolleyballFields {
        player: Some(text(caps, "server")?.to_string()),
        point_team: Some(text(caps, "point_team")?.to_string()),
        ..Default::default()
    })
}

pub(crate) fn first_ball_kill(caps: &Captures<'_>, ctx: &()) -> Result<VolleyballFields, FieldError> {
    Ok(VolleyballFields {
        first_ball: true,
        ..player(caps, ctx)?
    })
}

/// `Block by A, B` credits an assisted block to both players.
pub(crate) fn block(caps: &Captures<'_>, _: &()) -> Result<VolleyballFields, FieldError> {
    let raw = text(caps, "blockers")?;
    let mut blockers = Participants::new();
    for name in raw.split(", ").map(str::trim).filter(|n| !n.is_empty()) {
        if !blockers.push(name) {
            return Err(FieldError::Shape(format!("more than two blockers in `{raw}`")));
        }
    }
    Ok(VolleyballFields {
        player: blockers.first().map(str::to_string),
        point_team: opt_owned(caps, "point_team"),
        action_type: opt_text(caps, "action").map(str::to_lowercase),
        blockers,
        ..Default::default()
    })
}
