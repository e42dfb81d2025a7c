//! Typed fields pulled out of a classified football line.
//!
//! An `Option` here is `None` only when the matched text form does not carry
//! the value (a solo tackle has no second tackler, a kneel has no receiver).
//! A capture the pattern requires but cannot find is an extraction error.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::error::FieldError;
use crate::football_rules::{FootballKind, NAME, SPOT, Scrubbed};
use crate::play::{Participants, Side};
use crate::rules::{number, opt_number, opt_owned, opt_text, text};
use crate::yardline::FieldFrame;

/// What the extractor may know about the snap.
#[derive(Debug, Clone)]
pub struct SnapContext {
    pub possession: Side,
    pub frame: FieldFrame,
    /// Absolute line of scrimmage, when a spot has been observed.
    pub scrimmage: Option<u8>,
}

impl SnapContext {
    fn spot(&self, caps: &Captures<'_>, name: &'static str) -> Result<Option<u8>, FieldError> {
        match opt_text(caps, name) {
            Some(token) => self.frame.resolve(token),
            None => Ok(None),
        }
    }

    fn side_of(&self, team: &str) -> Option<Side> {
        if team.eq_ignore_ascii_case(&self.frame.offense) {
            Some(self.possession)
        } else if team.eq_ignore_ascii_case(&self.frame.defense) {
            Some(self.possession.other())
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KickResult {
    Good,
    NoGood,
    Blocked,
}

impl KickResult {
    fn parse(raw: &str) -> Result<Self, FieldError> {
        match raw.to_lowercase().as_str() {
            "good" => Ok(KickResult::Good),
            "blocked" => Ok(KickResult::Blocked),
            "no good" | "missed" | "failed" => Ok(KickResult::NoGood),
            _ => Err(FieldError::Numeric {
                field: "result",
                raw: raw.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionResult {
    Success,
    Failure,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Fumble {
    pub fumbler: Option<String>,
    pub forced_by: Option<String>,
    pub recovered_by_team: Option<String>,
    pub recovered_by: Option<String>,
    /// True only when the recovering team is known to be the defense.
    pub lost: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PenaltyCall {
    pub team: Option<String>,
    pub side: Option<Side>,
    pub foul: Option<String>,
    pub player: Option<String>,
    pub yards: Option<u8>,
    pub from_spot: Option<u8>,
    pub to_spot: Option<u8>,
    pub declined: bool,
    pub offsetting: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlayFlags {
    pub touchdown: bool,
    pub safety: bool,
    pub touchback: bool,
    pub fair_catch: bool,
    pub out_of_bounds: bool,
    pub fumble: bool,
    pub no_play: bool,
    pub first_down: bool,
    pub shotgun: bool,
    pub no_huddle: bool,
    pub onside: bool,
    pub blocked: bool,
    pub kneel: bool,
    pub downed: bool,
    pub muffed: bool,
    pub injury: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FootballFields {
    pub passer: Option<String>,
    pub receiver: Option<String>,
    pub rusher: Option<String>,
    pub kicker: Option<String>,
    pub punter: Option<String>,
    pub returner: Option<String>,
    pub interceptor: Option<String>,
    pub holder: Option<String>,
    pub long_snapper: Option<String>,
    pub blocked_by: Option<String>,
    pub broken_up_by: Option<String>,
    pub qb_hurried_by: Option<String>,
    pub tacklers: Participants,
    pub sackers: Participants,
    pub fumble: Option<Fumble>,
    pub penalty: Option<PenaltyCall>,
    /// Team named by a housekeeping line: drive start, timeout, receiving team.
    pub team: Option<String>,
    pub toss_decision: Option<String>,
    pub quarter: Option<u8>,
    pub pass_length: Option<String>,
    pub pass_location: Option<String>,
    pub run_location: Option<String>,
    pub yards_gained: Option<i16>,
    pub passing_yards: Option<i16>,
    pub receiving_yards: Option<i16>,
    pub rushing_yards: Option<i16>,
    pub return_yards: Option<i16>,
    pub kick_distance: Option<u8>,
    pub air_yards: Option<i16>,
    pub yards_after_catch: Option<i16>,
    /// Absolute spot where the ball ended up.
    pub end_spot: Option<u8>,
    /// Absolute spot a pass was thrown to, or where a kick landed.
    pub target_spot: Option<u8>,
    pub kick_result: Option<KickResult>,
    pub conversion: Option<ConversionResult>,
    pub touchdown_side: Option<Side>,
    pub safety_side: Option<Side>,
    pub flags: PlayFlags,
}

impl FootballFields {
    pub fn is_touchdown(&self) -> bool {
        self.flags.touchdown
    }
}

fn yardage(
    caps: &Captures<'_>,
    whole: &'static str,
    gain: &'static str,
    losses: &[&'static str],
) -> Result<Option<i16>, FieldError> {
    if opt_text(caps, whole).is_none() {
        return Ok(None);
    }
    if let Some(gained) = opt_number::<i16>(caps, gain)? {
        return Ok(Some(gained));
    }
    for loss in losses {
        if let Some(lost) = opt_number::<i16>(caps, loss)? {
            return Ok(Some(-lost));
        }
    }
    // The only remaining alternative is "no gain".
    Ok(Some(0))
}

fn play_yards(caps: &Captures<'_>) -> Result<Option<i16>, FieldError> {
    yardage(caps, "yards", "gain", &["loss", "loss_alt"])
}

fn return_yards(caps: &Captures<'_>) -> Result<Option<i16>, FieldError> {
    yardage(caps, "ret", "ret_gain", &["ret_loss"])
}

fn tacklers(caps: &Captures<'_>, name: &'static str) -> Result<Participants, FieldError> {
    match opt_text(caps, name) {
        None => Ok(Participants::new()),
        Some(raw) => Participants::from_list(raw, ';')
            .ok_or_else(|| FieldError::Shape(format!("more than two names credited in `{raw}`"))),
    }
}

fn downfield(spot: Option<u8>, scrimmage: Option<u8>) -> Option<i16> {
    Some(spot? as i16 - scrimmage? as i16)
}

pub(crate) fn none(_: &Captures<'_>, _: &SnapContext) -> Result<FootballFields, FieldError> {
    Ok(FootballFields::default())
}

pub(crate) fn team_line(caps: &Captures<'_>, _: &SnapContext) -> Result<FootballFields, FieldError> {
    Ok(FootballFields {
        team: Some(text(caps, "team")?.to_string()),
        ..Default::default()
    })
}

pub(crate) fn quarter_start(
    caps: &Captures<'_>,
    _: &SnapContext,
) -> Result<FootballFields, FieldError> {
    let label = text(caps, "quarter")?;
    let digit: String = label.chars().take_while(char::is_ascii_digit).collect();
    let quarter = digit.parse::<u8>().map_err(|_| FieldError::Numeric {
        field: "quarter",
        raw: label.to_string(),
    })?;
    Ok(FootballFields {
        quarter: Some(quarter),
        ..Default::default()
    })
}

pub(crate) fn overtime_start(
    caps: &Captures<'_>,
    _: &SnapContext,
) -> Result<FootballFields, FieldError> {
    let nth = opt_number::<u8>(caps, "ot")?.unwrap_or(1);
    Ok(FootballFields {
        quarter: Some(4 + nth),
        ..Default::default()
    })
}

pub(crate) fn coin_toss(caps: &Captures<'_>, _: &SnapContext) -> Result<FootballFields, FieldError> {
    Ok(FootballFields {
        team: Some(text(caps, "team")?.to_string()),
        toss_decision: Some(text(caps, "decision")?.to_lowercase()),
        ..Default::default()
    })
}

pub(crate) fn will_receive(
    caps: &Captures<'_>,
    _: &SnapContext,
) -> Result<FootballFields, FieldError> {
    Ok(FootballFields {
        team: Some(text(caps, "team")?.to_string()),
        toss_decision: Some("receive".to_string()),
        ..Default::default()
    })
}

pub(crate) fn interception(
    caps: &Captures<'_>,
    ctx: &SnapContext,
) -> Result<FootballFields, FieldError> {
    let interceptor = opt_owned(caps, "interceptor");
    let returner = opt_owned(caps, "returner").or_else(|| interceptor.clone());
    let ret = return_yards(caps)?;
    Ok(FootballFields {
        passer: Some(text(caps, "passer")?.to_string()),
        interceptor,
        returner: ret.and(returner),
        return_yards: ret,
        target_spot: ctx.spot(caps, "at")?,
        end_spot: ctx.spot(caps, "end")?,
        tacklers: tacklers(caps, "tacklers")?,
        ..Default::default()
    })
}

/// Interception lines whose return clause is mandatory.
pub(crate) fn interception_return(
    caps: &Captures<'_>,
    ctx: &SnapContext,
) -> Result<FootballFields, FieldError> {
    text(caps, "returner")?;
    interception(caps, ctx)
}

pub(crate) fn pass_incomplete(
    caps: &Captures<'_>,
    ctx: &SnapContext,
) -> Result<FootballFields, FieldError> {
    let target = ctx.spot(caps, "target")?;
    Ok(FootballFields {
        passer: Some(text(caps, "passer")?.to_string()),
        receiver: opt_owned(caps, "receiver"),
        pass_length: opt_owned(caps, "length"),
        pass_location: opt_owned(caps, "location"),
        broken_up_by: opt_owned(caps, "breakup"),
        target_spot: target,
        air_yards: downfield(target, ctx.scrimmage),
        yards_gained: Some(0),
        ..Default::default()
    })
}

pub(crate) fn sack(caps: &Captures<'_>, ctx: &SnapContext) -> Result<FootballFields, FieldError> {
    let yards = play_yards(caps)?.ok_or(FieldError::Missing("yards"))?;
    Ok(FootballFields {
        passer: Some(text(caps, "passer")?.to_string()),
        yards_gained: Some(yards),
        end_spot: ctx.spot(caps, "end")?,
        sackers: tacklers(caps, "sackers")?,
        ..Default::default()
    })
}

pub(crate) fn pass_complete(
    caps: &Captures<'_>,
    ctx: &SnapContext,
) -> Result<FootballFields, FieldError> {
    let yards = play_yards(caps)?.ok_or(FieldError::Missing("yards"))?;
    let target = ctx.spot(caps, "target")?;
    let air = downfield(target, ctx.scrimmage);
    Ok(FootballFields {
        passer: Some(text(caps, "passer")?.to_string()),
        receiver: Some(text(caps, "receiver")?.to_string()),
        pass_length: opt_owned(caps, "length"),
        pass_location: opt_owned(caps, "location"),
        yards_gained: Some(yards),
        passing_yards: Some(yards),
        receiving_yards: Some(yards),
        target_spot: target,
        air_yards: air,
        yards_after_catch: air.map(|air| yards - air),
        end_spot: ctx.spot(caps, "end")?,
        tacklers: tacklers(caps, "tacklers")?,
        ..Default::default()
    })
}

pub(crate) fn pass_complete_no_yardage(
    caps: &Captures<'_>,
    _: &SnapContext,
) -> Result<FootballFields, FieldError> {
    Ok(FootballFields {
        passer: Some(text(caps, "passer")?.to_string()),
        receiver: Some(text(caps, "receiver")?.to_string()),
        pass_length: opt_owned(caps, "length"),
        pass_location: opt_owned(caps, "location"),
        ..Default::default()
    })
}

fn conversion(caps: &Captures<'_>, result: ConversionResult) -> Result<FootballFields, FieldError> {
    let passer = opt_owned(caps, "passer");
    let rusher = opt_owned(caps, "rusher");
    if passer.is_none() && rusher.is_none() {
        return Err(FieldError::Missing("passer"));
    }
    Ok(FootballFields {
        passer,
        rusher,
        receiver: opt_owned(caps, "receiver"),
        conversion: Some(result),
        ..Default::default()
    })
}

pub(crate) fn conversion_failed(
    caps: &Captures<'_>,
    _: &SnapContext,
) -> Result<FootballFields, FieldError> {
    conversion(caps, ConversionResult::Failure)
}

pub(crate) fn conversion_good(
    caps: &Captures<'_>,
    _: &SnapContext,
) -> Result<FootballFields, FieldError> {
    conversion(caps, ConversionResult::Success)
}

/// `X rush for N yards to SPOT`, or `X rush to SPOT` where the gain is the
/// distance from the line of scrimmage to where the ball ended up.
pub(crate) fn rush(caps: &Captures<'_>, ctx: &SnapContext) -> Result<FootballFields, FieldError> {
    let end = ctx.spot(caps, "end")?;
    let yards = match play_yards(caps)? {
        Some(yards) => yards,
        None => downfield(end, ctx.scrimmage).ok_or(FieldError::Missing("yards"))?,
    };
    Ok(FootballFields {
        rusher: Some(text(caps, "rusher")?.to_string()),
        run_location: opt_owned(caps, "run_location"),
        yards_gained: Some(yards),
        rushing_yards: Some(yards),
        end_spot: end,
        tacklers: tacklers(caps, "tacklers")?,
        ..Default::default()
    })
}

pub(crate) fn kneel(caps: &Captures<'_>, ctx: &SnapContext) -> Result<FootballFields, FieldError> {
    let yards = play_yards(caps)?;
    let mut fields = FootballFields {
        rusher: Some(text(caps, "rusher")?.to_string()),
        yards_gained: yards,
        rushing_yards: yards,
        end_spot: ctx.spot(caps, "end")?,
        ..Default::default()
    };
    fields.flags.kneel = true;
    Ok(fields)
}

pub(crate) fn kickoff(caps: &Captures<'_>, ctx: &SnapContext) -> Result<FootballFields, FieldError> {
    let ret = return_yards(caps)?;
    Ok(FootballFields {
        kicker: Some(text(caps, "kicker")?.to_string()),
        kick_distance: Some(number::<u8>(caps, "distance")?),
        target_spot: ctx.spot(caps, "land")?,
        returner: opt_owned(caps, "returner"),
        return_yards: ret,
        end_spot: ctx.spot(caps, "end")?.or(ctx.spot(caps, "land")?),
        tacklers: tacklers(caps, "tacklers")?,
        ..Default::default()
    })
}

fn place_kick(caps: &Captures<'_>) -> Result<FootballFields, FieldError> {
    Ok(FootballFields {
        kicker: Some(text(caps, "kicker")?.to_string()),
        kick_result: Some(KickResult::parse(text(caps, "result")?)?),
        holder: opt_owned(caps, "holder"),
        long_snapper: opt_owned(caps, "snapper"),
        ..Default::default()
    })
}

pub(crate) fn extra_point(
    caps: &Captures<'_>,
    _: &SnapContext,
) -> Result<FootballFields, FieldError> {
    place_kick(caps)
}

pub(crate) fn field_goal(
    caps: &Captures<'_>,
    _: &SnapContext,
) -> Result<FootballFields, FieldError> {
    Ok(FootballFields {
        kick_distance: Some(number::<u8>(caps, "distance")?),
        ..place_kick(caps)?
    })
}

pub(crate) fn punt(caps: &Captures<'_>, ctx: &SnapContext) -> Result<FootballFields, FieldError> {
    let ret = return_yards(caps)?;
    let land = ctx.spot(caps, "land")?;
    Ok(FootballFields {
        punter: Some(text(caps, "punter")?.to_string()),
        kick_distance: opt_number::<u8>(caps, "distance")?,
        target_spot: land,
        returner: opt_owned(caps, "returner"),
        return_yards: ret,
        end_spot: ctx.spot(caps, "end")?.or(land),
        tacklers: tacklers(caps, "tacklers")?,
        ..Default::default()
    })
}

pub(crate) fn injury_timeout(
    _: &Captures<'_>,
    _: &SnapContext,
) -> Result<FootballFields, FieldError> {
    let mut fields = FootballFields::default();
    fields.flags.injury = true;
    Ok(fields)
}

pub(crate) fn ball_on(caps: &Captures<'_>, ctx: &SnapContext) -> Result<FootballFields, FieldError> {
    Ok(FootballFields {
        end_spot: ctx.spot(caps, "end")?,
        ..Default::default()
    })
}

static FUMBLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i:fumbled by|fumble by) (?P<who>{NAME})")).expect("fumbler pattern compiles")
});

static FORCED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i:forced by) (?P<who>{NAME})")).expect("forced pattern compiles")
});

static RECOVERED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i:recovered by) (?P<team>[A-Za-z&]{{2,8}})(?: (?P<who>{NAME}))?"
    ))
    .expect("recovery pattern compiles")
});

static BLOCKED_BY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i:blocked by) (?P<who>{NAME})")).expect("block pattern compiles")
});

static PENALTY_ENFORCED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i:penalty) (?P<team>[A-Za-z&]{{2,8}}) (?P<foul>[A-Za-z][A-Za-z /\-]*?)(?: \((?P<player>[^)]*)\))? (?P<yards>\d+) yards? (?:from (?:the )?(?P<from>{SPOT}) )?to (?:the )?(?P<to>{SPOT})"
    ))
    .expect("penalty pattern compiles")
});

static PENALTY_DECLINED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i:penalty) (?P<team>[A-Za-z&]{2,8}) (?P<foul>[A-Za-z][A-Za-z /\-]*?)(?: \((?P<player>[^)]*)\))? (?i:declined)",
    )
    .expect("declined pattern compiles")
});

fn who(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| opt_owned(&caps, "who"))
}

fn penalty_call(text: &str, ctx: &SnapContext) -> Result<PenaltyCall, FieldError> {
    let lower = text.to_lowercase();
    if lower.contains("off-setting") || lower.contains("offsetting") {
        return Ok(PenaltyCall {
            offsetting: true,
            ..Default::default()
        });
    }
    let named = |caps: &Captures<'_>| {
        let team = opt_owned(caps, "team");
        PenaltyCall {
            side: team.as_deref().and_then(|t| ctx.side_of(t)),
            team,
            foul: opt_text(caps, "foul").map(str::to_lowercase),
            player: opt_owned(caps, "player"),
            ..Default::default()
        }
    };
    if let Some(caps) = PENALTY_DECLINED.captures(text) {
        return Ok(PenaltyCall {
            declined: true,
            ..named(&caps)
        });
    }
    if let Some(caps) = PENALTY_ENFORCED.captures(text) {
        return Ok(PenaltyCall {
            yards: Some(number::<u8>(&caps, "yards")?),
            from_spot: ctx.spot(&caps, "from")?,
            to_spot: ctx.spot(&caps, "to")?,
            ..named(&caps)
        });
    }
    Err(FieldError::Shape("penalty clause not understood".to_string()))
}

/// Layers the clauses any line may carry on top of the rule's own fields:
/// formation and status markers, fumbles, blocks, penalties and which side
/// a touchdown or safety belongs to.
pub(crate) fn finish(
    mut fields: FootballFields,
    kind: FootballKind,
    scrubbed: &Scrubbed,
    ctx: &SnapContext,
) -> Result<FootballFields, FieldError> {
    let text = scrubbed.text.as_str();
    let lower = text.to_lowercase();
    let flags = &mut fields.flags;
    flags.shotgun = scrubbed.shotgun;
    flags.no_huddle = scrubbed.no_huddle;
    flags.first_down = scrubbed.first_down;
    flags.no_play = scrubbed.no_play;
    flags.touchdown = lower.contains("touchdown");
    flags.safety = lower.contains("safety");
    flags.touchback = lower.contains("touchback");
    flags.fair_catch = lower.contains("fair catch");
    flags.out_of_bounds = lower.contains("out of bounds") || lower.contains("out-of-bounds");
    flags.fumble = lower.contains("fumble");
    flags.onside = flags.onside || lower.contains("onside") || lower.contains("on-side");
    flags.blocked = lower.contains("blocked");
    flags.downed = lower.contains("downed");
    flags.muffed = lower.contains("muff");
    fields.qb_hurried_by = scrubbed.qb_hurried_by.clone();

    if fields.flags.fumble {
        let recovery = RECOVERED.captures(text);
        let recovered_by_team = recovery.as_ref().and_then(|c| opt_owned(c, "team"));
        let lost = recovered_by_team
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(&ctx.frame.defense));
        fields.fumble = Some(Fumble {
            fumbler: who(&FUMBLER, text),
            forced_by: who(&FORCED, text),
            recovered_by: recovery.as_ref().and_then(|c| opt_owned(c, "who")),
            recovered_by_team,
            lost,
        });
    }
    if fields.flags.blocked {
        fields.blocked_by = who(&BLOCKED_BY, text);
    }
    if lower.contains("penalty") {
        fields.penalty = Some(penalty_call(text, ctx)?);
    }

    let possession = ctx.possession;
    if fields.flags.touchdown {
        let recovered = fields
            .fumble
            .as_ref()
            .and_then(|f| f.recovered_by_team.as_deref())
            .and_then(|team| ctx.side_of(team));
        fields.touchdown_side = recovered.or(match kind {
            FootballKind::PassComplete | FootballKind::RushAttempt => Some(possession),
            FootballKind::Interception
            | FootballKind::Sack
            | FootballKind::Kickoff
            | FootballKind::Punt => Some(possession.other()),
            _ => None,
        });
    }
    if fields.flags.safety {
        fields.safety_side = match kind {
            FootballKind::Kickoff | FootballKind::Punt => Some(possession),
            _ => Some(possession.other()),
        };
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::{KickResult, SnapContext, penalty_call};
    use crate::play::Side;
    use crate::yardline::FieldFrame;

    fn ctx() -> SnapContext {
        SnapContext {
            possession: Side::Home,
            frame: FieldFrame::new("UNC", "DUKE"),
            scrimmage: Some(25),
        }
    }

    #[test]
    fn kick_results() {
        assert_eq!(KickResult::parse("GOOD").ok(), Some(KickResult::Good));
        assert_eq!(KickResult::parse("missed").ok(), Some(KickResult::NoGood));
        assert!(KickResult::parse("wide").is_err());
    }

    #[test]
    fn enforced_penalty_clause() {
        let call = penalty_call(
            "PENALTY DUKE pass interference (A. Lee) 15 yards from DUKE45 to DUKE30",
            &ctx(),
        )
        .expect("penalty parses");
        assert_eq!(call.side, Some(Side::Away));
        assert_eq!(call.foul.as_deref(), Some("pass interference"));
        assert_eq!(call.player.as_deref(), Some("A. Lee"));
        assert_eq!(call.yards, Some(15));
        assert_eq!((call.from_spot, call.to_spot), (Some(55), Some(70)));
    }

    #[test]
    fn declined_and_offsetting_penalties() {
        let call = penalty_call("PENALTY UNC holding declined", &ctx()).expect("declined parses");
        assert!(call.declined);
        assert_eq!(call.side, Some(Side::Home));
        let call = penalty_call("PENALTY off-setting", &ctx()).expect("offsetting parses");
        assert!(call.offsetting);
        assert!(penalty_call("PENALTY something odd", &ctx()).is_err());
    }
}
