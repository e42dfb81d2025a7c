use serde::Serialize;

use crate::error::{FieldError, ParseError};
use crate::football_extract::{ConversionResult, FootballFields, KickResult, SnapContext};
use crate::football_rules::{self, FootballKind};
use crate::pipeline::{Sport, Step};
use crate::play::{ContestMeta, RawPlay, Side};
use crate::yardline::{FieldFrame, parse_situation};

pub const TOUCHDOWN: u16 = 6;
pub const EXTRA_POINT: u16 = 1;
pub const TWO_POINT: u16 = 2;
pub const FIELD_GOAL: u16 = 3;
pub const SAFETY: u16 = 2;

/// Running football state. Snapshots of it are attached to every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameState {
    pub possession: Side,
    pub defending: Side,
    pub home_score: u16,
    pub away_score: u16,
    /// Absolute spot in the possessing team's frame. `None` until observed.
    pub field_position: Option<u8>,
    pub down: Option<u8>,
    pub distance: Option<u8>,
    pub period: u8,
}

impl GameState {
    pub fn initial(first: Option<&RawPlay>) -> Self {
        let possession = first.map(|p| p.side).unwrap_or(Side::Home);
        Self {
            possession,
            defending: possession.other(),
            home_score: 0,
            away_score: 0,
            field_position: None,
            down: None,
            distance: None,
            period: first.map(|p| p.period).unwrap_or(1),
        }
    }

    pub fn score(&self, side: Side) -> u16 {
        match side {
            Side::Home => self.home_score,
            Side::Away => self.away_score,
        }
    }

    fn add(&mut self, side: Side, points: u16) {
        match side {
            Side::Home => self.home_score += points,
            Side::Away => self.away_score += points,
        }
    }

    pub fn frame(&self, meta: &ContestMeta) -> FieldFrame {
        FieldFrame::new(
            meta.team(self.possession).abbr.clone(),
            meta.team(self.defending).abbr.clone(),
        )
    }

    /// Folds the caller's snap context into the state, giving the pre-play
    /// snapshot. A change of possession flips the carried spot into the new
    /// offense's frame before any situation line overrides it.
    pub fn snap(&self, play: &RawPlay, meta: &ContestMeta) -> Result<GameState, FieldError> {
        let mut pre = self.clone();
        if play.side != self.possession {
            pre.field_position = self.field_position.map(|spot| 100 - spot);
            pre.down = None;
            pre.distance = None;
        }
        pre.possession = play.side;
        pre.defending = play.side.other();
        pre.period = play.period;

        if let Some(raw) = play.situation.as_deref() {
            let situation = parse_situation(raw)?;
            if let Some(spot) = pre.frame(meta).resolve(&situation.spot)? {
                pre.field_position = Some(spot);
            }
            pre.down = Some(situation.down);
            pre.distance = situation
                .distance
                .or_else(|| pre.field_position.map(|spot| 100 - spot));
        }
        Ok(pre)
    }
}

/// Points a play puts on the board and who gets them.
pub fn points(kind: FootballKind, fields: &FootballFields, possession: Side) -> Option<(Side, u16)> {
    if fields.flags.no_play {
        return None;
    }
    let touchdown_kind = matches!(
        kind,
        FootballKind::PassComplete
            | FootballKind::RushAttempt
            | FootballKind::Interception
            | FootballKind::Sack
            | FootballKind::Kickoff
            | FootballKind::Punt
    );
    if fields.flags.touchdown && touchdown_kind {
        return fields.touchdown_side.map(|side| (side, TOUCHDOWN));
    }
    if fields.flags.safety {
        return fields.safety_side.map(|side| (side, SAFETY));
    }
    match (kind, fields.kick_result, fields.conversion) {
        (FootballKind::ExtraPointAttempt, Some(KickResult::Good), _) => {
            Some((possession, EXTRA_POINT))
        }
        (FootballKind::FieldGoalAttempt, Some(KickResult::Good), _) => {
            Some((possession, FIELD_GOAL))
        }
        (FootballKind::TwoPointAttempt, _, Some(ConversionResult::Success)) => {
            Some((possession, TWO_POINT))
        }
        _ => None,
    }
}

/// Applies one play to the pre-play snapshot. The result is both the
/// post-play snapshot and the state the next play starts from.
pub fn advance(pre: &GameState, kind: FootballKind, fields: &FootballFields) -> GameState {
    let mut post = pre.clone();
    if let Some((side, pts)) = points(kind, fields, pre.possession) {
        post.add(side, pts);
    }
    if fields.flags.no_play {
        return post;
    }

    let gained = fields.yards_gained.filter(|_| kind.is_scrimmage());
    post.field_position = match fields.end_spot {
        Some(spot) => Some(spot),
        None if kind.is_scrimmage() => pre
            .field_position
            .zip(gained)
            .map(|(spot, gained)| (spot as i16 + gained).clamp(0, 100) as u8),
        // Bookkeeping lines leave the ball where it was.
        None => pre.field_position,
    };

    if kind.is_scrimmage() {
        if fields.flags.first_down {
            post.down = Some(1);
            post.distance = Some(10);
        } else if let (Some(down), Some(distance), Some(gained)) = (pre.down, pre.distance, gained)
        {
            let to_go = distance as i16 - gained;
            if to_go <= 0 {
                post.down = Some(1);
                post.distance = Some(10);
            } else {
                // Past fourth down the ball turns over; the next situation says where.
                post.down = (down < 4).then_some(down + 1);
                post.distance = Some(to_go.min(99) as u8);
            }
        }
    }
    post
}

/// The yard-based sport.
#[derive(Debug, Clone, Copy, Default)]
pub struct Football;

impl Sport for Football {
    type Kind = FootballKind;
    type Fields = FootballFields;
    type State = GameState;

    const NAME: &'static str = "football";

    fn initial_state(_meta: &ContestMeta, first: Option<&RawPlay>) -> GameState {
        GameState::initial(first)
    }

    fn step(state: &GameState, meta: &ContestMeta, play: &RawPlay) -> Result<Step<Self>, ParseError> {
        let pre = state.snap(play, meta).map_err(|err| {
            err.into_parse("situation", play.situation.as_deref().unwrap_or_default())
        })?;
        let ctx = SnapContext {
            possession: pre.possession,
            frame: pre.frame(meta),
            scrimmage: pre.field_position,
        };
        let parsed = football_rules::parse_line(&play.text, &ctx)?;
        let post = advance(&pre, parsed.matched.kind, &parsed.fields);
        Ok(Step {
            matched: parsed.matched,
            fields: parsed.fields,
            pre,
            post,
        })
    }
}
