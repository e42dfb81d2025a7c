//! Volleyball play classification.
//!
//! Ordering matters wherever one phrase contains another: the point-form
//! service error precedes the bare one, "bad set by" precedes "set by", and
//! the first-ball kill precedes the plain kill. Player actions may carry the
//! `Point TEAM: (server)` prefix of the rally they ended.

use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::trace;

use crate::error::ParseError;
use crate::rules::{Guard, Matched, Rule, RuleTable};
use crate::volleyball_extract::{self as vx, VolleyballFields};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VolleyballKind {
    Serve,
    ServiceAce,
    ServiceError,
    Reception,
    Set,
    SetError,
    Attack,
    AttackError,
    Dig,
    DigError,
    Kill,
    BlockAttempt,
    BlockError,
    BallHandlingError,
    Substitution,
    Timeout,
    Challenge,
    StartingLineup,
    EndOfSet,
    EndOfMatch,
    Administrative,
    Unrecognized,
}

const PLAYER: &str = r"[A-Za-z0-9,.'\- ]+?";

/// Acting player, an optional `(from X)` credit or other aside, then the
/// end of the line.
const WHO: &str = r"(?P<player>{PLAYER})(?: \(from (?P<assist>[^)]+)\)| \([^)]*\))?\.?\s*$";

const POINT: &str = r"(?i:point) (?P<point_team>[^:]+): \((?P<server>[^)]+)\)";

const FRAGMENTS: &[(&str, &str)] = &[("{WHO}", WHO), ("{POINT}", POINT), ("{PLAYER}", PLAYER)];

macro_rules! rule {
    ($name:literal, $kind:ident, $guard:expr, $pattern:expr, $extract:path) => {
        Rule {
            name: $name,
            kind: VolleyballKind::$kind,
            guard: $guard,
            pattern: $pattern,
            extract: $extract,
        }
    };
}

static RULES: &[Rule<VolleyballKind, VolleyballFields, ()>] = &[
    rule!("match_marker", Administrative, Guard::any_of(&["match started", "set started", "set ended", "match ended"]), r".+", vx::none),
    rule!("end_match", EndOfMatch, Guard::all(&["end match"]), r".+", vx::none),
    rule!("independent_team", Administrative, Guard::shape(r"^\s*team\(independent\) by team\s*$"), r".+", vx::none),
    rule!("end_of_set_note", Administrative, Guard::all(&["end of", "set"]), r".+", vx::none),
    rule!("end_set", EndOfSet, Guard::all(&["end set"]), r".+", vx::none),
    rule!("media_timeout", Timeout, Guard::any_of(&["media timeout", "facultative timeout"]), r".+", vx::none),
    rule!("timeout", Timeout, Guard::all(&["timeout "]), r"(?i:timeout) (?P<team>[A-Za-z0-9,.'\- ()]+?)\.?\s*$", vx::timeout),
    rule!("starters", StartingLineup, Guard::all(&["starters:"]), r"^(?P<team>[^:]+?) (?i:starters): (?P<players>.+?)\.?\s*$", vx::lineup),
    rule!("challenge", Challenge, Guard::all(&["challenge"]), r"^(?P<team>.*?)\s*(?i:challenge)", vx::team_line),
    rule!("sub_in", Substitution, Guard::all(&["sub in"]), r"(?i:sub in) (?P<players>{PLAYER})\.?\s*$", vx::sub_in),
    rule!("sub_out", Substitution, Guard::all(&["sub out"]), r"(?i:sub out) (?P<players>{PLAYER})\.?\s*$", vx::sub_out),
    rule!("substitution_by", Substitution, Guard::all(&["substitution by"]), r"(?i:substitution by) (?P<players>{PLAYER})\.?\s*$", vx::sub_by),
    rule!("team_subs", Substitution, Guard::all(&["subs:"]), r"^(?P<team>[^:]+?) (?i:subs): (?P<players>.+?)\.?\s*$", vx::team_subs),
    rule!("serve", Serve, Guard::all(&["serves"]), r"^(?P<player>{PLAYER}) serves", vx::player),
    rule!("service_ace", ServiceAce, Guard::all(&[") service ace"]), r"{POINT} (?i:service ace)", vx::server),
    rule!("service_error_point", ServiceError, Guard::all(&[") service error"]), r"{POINT} (?i:service error)", vx::server),
    rule!("service_error", ServiceError, Guard::all(&["service error"]), r"^(?P<player>{PLAYER}) (?i:service error)", vx::player),
    rule!("reception", Reception, Guard::all(&["reception by"]), r"(?:{POINT} )?(?i:reception by) {WHO}", vx::player),
    rule!("bad_set", SetError, Guard::all(&["bad set by"]), r"{POINT} (?i:bad set by) {WHO}", vx::player),
    rule!("typed_set", Set, Guard::all(&["set(", ") by"]), r"(?:{POINT} )?(?i:set)\((?P<action>[A-Za-z ]+)\) (?i:by) {WHO}", vx::player),
    rule!("set", Set, Guard::all(&["set by"]), r"(?:{POINT} )?(?i:set by) {WHO}", vx::player),
    rule!("set_error", SetError, Guard::all(&["set error by"]), r"(?:{POINT} )?(?i:set error by) {WHO}", vx::player),
    rule!("attack_error", AttackError, Guard::all(&["attack error by"]), r"(?:{POINT} )?(?i:attack error by) {WHO}", vx::player),
    rule!("typed_attack", Attack, Guard::all(&["attack(", ") by"]), r"(?:{POINT} )?(?i:attack)\((?P<action>[A-Za-z ]+)\) (?i:by) {WHO}", vx::player),
    rule!("attack", Attack, Guard::all(&["attack by"]), r"(?:{POINT} )?(?i:attack by) {WHO}", vx::player),
    rule!("dig", Dig, Guard::all(&["dig by"]), r"(?:{POINT} )?(?i:dig by) {WHO}", vx::player),
    rule!("dig_error", DigError, Guard::all(&["dig error by"]), r"(?:{POINT} )?(?i:dig error by) {WHO}", vx::player),
    rule!("first_ball_kill", Kill, Guard::all(&["first ball kill"]), r"(?:{POINT} )?(?i:first ball kill by) {WHO}", vx::first_ball_kill),
    rule!("kill", Kill, Guard::all(&["kill by "]), r"(?:{POINT} )?(?i:kill by) {WHO}", vx::player),
    rule!("block_error", BlockError, Guard::all(&["block error by"]), r"(?:{POINT} )?(?i:block error by) {WHO}", vx::player),
    rule!("block", BlockAttempt, Guard::all(&["block by"]), r"(?:{POINT} )?(?i:block by) (?P<blockers>[A-Za-z0-9,.'\- ]+?)\.?\s*$", vx::block),
    rule!("typed_block", BlockAttempt, Guard::all(&["block(", ") by"]), r"(?:{POINT} )?(?i:block)\((?P<action>[A-Za-z ]+)\) (?i:by) (?P<blockers>[A-Za-z0-9,.'\- ]+?)\.?\s*$", vx::block),
    rule!("ball_handling_error", BallHandlingError, Guard::all(&["ball handling error by"]), r"(?:{POINT} )?(?i:ball handling error by) {WHO}", vx::player),
    rule!("typed_reception", Reception, Guard::all(&["reception(", ") by"]), r"(?:{POINT} )?(?i:reception)\((?P<action>[A-Za-z ]+)\) (?i:by) {WHO}", vx::player),
];

pub static VOLLEYBALL_RULES: Lazy<RuleTable<VolleyballKind, VolleyballFields, ()>> =
    Lazy::new(|| RuleTable::compile(RULES, FRAGMENTS).expect("volleyball rule patterns compile"));

#[derive(Debug, Clone)]
pub struct ParsedLine {
    pub matched: Matched<VolleyballKind>,
    pub fields: VolleyballFields,
}

pub fn classify(raw: &str) -> VolleyballKind {
    match VOLLEYBALL_RULES.classify(raw.trim()) {
        Some(matched) => {
            trace!(rule = matched.name, "volleyball rule fired");
            matched.kind
        }
        None => VolleyballKind::Unrecognized,
    }
}

pub fn parse_line(raw: &str) -> Result<ParsedLine, ParseError> {
    let text = raw.trim();
    let matched = VOLLEYBALL_RULES
        .classify(text)
        .ok_or_else(|| ParseError::ClassificationGap {
            text: raw.to_string(),
        })?;
    trace!(rule = matched.name, "volleyball rule fired");
    let fields = VOLLEYBALL_RULES.extract(&matched, text, &())?;
    Ok(ParsedLine { matched, fields })
}
