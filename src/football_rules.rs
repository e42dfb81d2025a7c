//! Football play classification.
//!
//! `FOOTBALL_RULES` is evaluated top to bottom and the first guard that holds
//! wins. Families are ordered most specific first: every rule that needs
//! "touchdown", "fumble" or "out of bounds" on top of a base phrase sits above
//! the plain rule for that phrase. Fumble rules sit above touchdown rules so a
//! recovered-and-returned ball credits the recovering side.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::trace;

use crate::error::ParseError;
use crate::football_extract::{self as fx, FootballFields, SnapContext};
use crate::rules::{Guard, Matched, Rule, RuleTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FootballKind {
    PassComplete,
    PassIncomplete,
    Interception,
    Sack,
    RushAttempt,
    Kickoff,
    Punt,
    FieldGoalAttempt,
    ExtraPointAttempt,
    TwoPointAttempt,
    Penalty,
    Timeout,
    CoinToss,
    DriveStart,
    QuarterStart,
    EndOfHalf,
    EndOfGame,
    Administrative,
    Unrecognized,
}

impl FootballKind {
    /// Kinds that run a play from scrimmage and move the chains.
    pub fn is_scrimmage(self) -> bool {
        matches!(
            self,
            FootballKind::PassComplete
                | FootballKind::PassIncomplete
                | FootballKind::Sack
                | FootballKind::RushAttempt
        )
    }
}

/// Player name: capitalised tokens joined by spaces or commas. Lowercase
/// particles (`de Leon`, `van der Berg`) may sit between tokens.
pub const NAME: &str = r"[A-Z][A-Za-z.'\-]*(?:(?:, ?| )(?:(?:de|del|della|da|di|du|la|le|van|von|der|den|ter|ten|st\.) )*[A-Z][A-Za-z.'\-]*)*";

/// Yard marker: `UNC25`, `DUKE 40`, `35` or `UNC end zone`.
pub const SPOT: &str = r"(?:[A-Za-z&]{2,8} ?\d{1,2}|\d{1,2}|[A-Za-z&]{2,8} end ?zone)";

const YARDS: &str = r"(?P<yards>loss of (?P<loss>\d+) yards?|no gain|(?P<loss_alt>\d+) yards? loss|(?P<gain>-?\d+) yards?(?: gain)?)";

const RET: &str = r"(?:for )?(?P<ret>loss of (?P<ret_loss>\d+) yards?|no gain|(?P<ret_gain>-?\d+) yards?)";

const TACKLE: &str = r"(?: \((?P<tacklers>[^)]*)\))?";

const FRAGMENTS: &[(&str, &str)] = &[
    ("{NAME}", NAME),
    ("{SPOT}", SPOT),
    ("{YARDS}", YARDS),
    ("{RET}", RET),
    ("{TACKLE}", TACKLE),
];

const INTERCEPTION: &str = r"^(?P<passer>{NAME}) pass intercepted(?: by (?P<interceptor>{NAME}))?(?: at (?:the )?(?P<at>{SPOT}))?(?:,? (?P<returner>{NAME}) return {RET}(?: to (?:the )?(?P<end>{SPOT}))?)?{TACKLE}";
const INCOMPLETE: &str = r"^(?P<passer>{NAME}) pass incomplete(?: (?P<length>short|deep))?(?: (?P<location>left|middle|right))?(?: to (?P<receiver>{NAME}))?(?:,? thrown to (?:the )?(?P<target>{SPOT}))?(?:,? (?:broken up|break up) by (?P<breakup>{NAME}))?";
const SACK: &str = r"^(?P<passer>{NAME}) sacked for {YARDS}(?: to (?:the )?(?P<end>{SPOT}))?(?: \((?P<sackers>[^)]*)\))?";
const COMPLETE: &str = r"^(?P<passer>{NAME}) pass complete(?: (?P<length>short|deep))?(?: (?P<location>left|middle|right))? to (?P<receiver>{NAME})(?:,? caught at (?:the )?(?P<target>{SPOT}),?)? for {YARDS}(?: to (?:the )?(?P<end>{SPOT}))?{TACKLE}";
const COMPLETE_BARE: &str = r"^(?P<passer>{NAME}) pass complete(?: (?P<length>short|deep))?(?: (?P<location>left|middle|right))? to (?P<receiver>{NAME})";
const PASS_ATTEMPT: &str = r"^(?P<passer>{NAME}) pass attempt(?: to (?P<receiver>{NAME}))?";
const RUSH_ATTEMPT: &str = r"^(?P<rusher>{NAME}) rush attempt";
const KNEEL: &str = r"^(?P<rusher>{NAME}) (?:kneel down|kneels|kneel)(?: for {YARDS})?(?: (?:at|to) (?:the )?(?P<end>{SPOT}))?";
const RUSH: &str = r"^(?P<rusher>{NAME}) rush(?: (?P<run_location>left|middle|right|up the middle))?(?: for {YARDS})?(?: to (?:the )?(?P<end>{SPOT}))?{TACKLE}";
const KICKOFF: &str = r"^(?P<kicker>{NAME}) (?:onside |on-side )?kick(?:off)? (?P<distance>\d+) yards? to (?:the )?(?P<land>{SPOT})(?:,? (?P<returner>{NAME}) return {RET}(?: to (?:the )?(?P<end>{SPOT}))?)?{TACKLE}";
const PUNT: &str = r"^(?P<punter>{NAME}) punt(?: (?P<distance>\d+) yards?(?: to (?:the )?(?P<land>{SPOT}))?)?(?:,? (?P<returner>{NAME}) return {RET}(?: to (?:the )?(?P<end>{SPOT}))?)?{TACKLE}";
const EXTRA_POINT: &str = r"^(?P<kicker>{NAME}) kick attempt (?P<result>(?i:no good|good|missed|failed|blocked))(?: \(H: (?P<holder>{NAME}), LS: (?P<snapper>{NAME})\))?";
const FIELD_GOAL: &str = r"^(?P<kicker>{NAME}) field goal attempt from (?P<distance>\d+) (?:yards? |yds? )?(?P<result>(?i:no good|good|missed|failed|blocked))(?: \(H: (?P<holder>{NAME}), LS: (?P<snapper>{NAME})\))?";

const OUT_OF_BOUNDS: &[&str] = &["out of bounds", "out-of-bounds"];
const CONVERSION_FAILED: &[&str] = &["failed", "no good", "unsuccessful"];

macro_rules! rule {
    ($name:literal, $kind:ident, $guard:expr, $pattern:expr, $extract:path) => {
        Rule {
            name: $name,
            kind: FootballKind::$kind,
            guard: $guard,
            pattern: $pattern,
            extract: $extract,
        }
    };
}

static RULES: &[Rule<FootballKind, FootballFields, SnapContext>] = &[
    rule!("drive_start", DriveStart, Guard::all(&["drive start"]), r"(?i)^(?P<team>.+?) drive start", fx::team_line),
    rule!("end_of_half", EndOfHalf, Guard::all(&["end of half"]), r"(?i)end of half", fx::none),
    rule!("overtime_start", QuarterStart, Guard::all(&["start of"]).or(&["overtime", " ot"]), r"(?i)start of (?:the )?(?:(?P<ot>\d)(?:st|nd|rd|th) )?(?:overtime|ot)", fx::overtime_start),
    rule!("quarter_start", QuarterStart, Guard::all(&["start of", "quarter"]), r"(?i)start of (?:the )?(?P<quarter>\d)(?:st|nd|rd|th)? quarter", fx::quarter_start),
    rule!("end_of_game", EndOfGame, Guard::all(&["end of game"]), r"(?i)end of game", fx::none),
    rule!("coin_toss", CoinToss, Guard::all(&["won the toss"]), r"(?i)^(?P<team>.+?) won the toss and (?:elected to |chose to |will )?(?P<decision>[a-z ]+)", fx::coin_toss),
    rule!("will_receive", CoinToss, Guard::all(&["will receive"]), r"(?i)^(?P<team>[^,]+?) will receive", fx::will_receive),
    rule!("no_play_penalty", Penalty, Guard::all(&["penalty", "no play"]), r"(?i)penalty", fx::none),
    // Interceptions.
    rule!("interception_touchdown", Interception, Guard::all(&["intercepted", "touchdown"]), INTERCEPTION, fx::interception),
    rule!("interception_touchback", Interception, Guard::all(&["intercepted", "touchback"]), INTERCEPTION, fx::interception),
    rule!("interception_return", Interception, Guard::all(&["intercepted", " return"]), INTERCEPTION, fx::interception_return),
    rule!("interception", Interception, Guard::all(&["intercepted"]), INTERCEPTION, fx::interception),
    rule!("pass_incomplete", PassIncomplete, Guard::all(&["pass incomplete"]), INCOMPLETE, fx::pass_incomplete),
    rule!("sack", Sack, Guard::all(&["sacked"]), SACK, fx::sack),
    // Completions.
    rule!("pass_complete_fumble", PassComplete, Guard::all(&["pass complete", "fumble*"]), COMPLETE, fx::pass_complete),
    rule!("pass_complete_touchdown", PassComplete, Guard::all(&["pass complete", "touchdown"]), COMPLETE, fx::pass_complete),
    rule!("pass_complete_out_of_bounds", PassComplete, Guard::all(&["pass complete"]).or(OUT_OF_BOUNDS), COMPLETE, fx::pass_complete),
    rule!("pass_complete_no_yardage", PassComplete, Guard::all(&["pass complete"]).but_not(&[" for "]), COMPLETE_BARE, fx::pass_complete_no_yardage),
    rule!("pass_complete", PassComplete, Guard::all(&["pass complete"]), COMPLETE, fx::pass_complete),
    // Two-point tries. "unsuccessful" and "no good" contain the success words.
    rule!("two_point_pass_failed", TwoPointAttempt, Guard::all(&["pass attempt"]).or(CONVERSION_FAILED), PASS_ATTEMPT, fx::conversion_failed),
    rule!("two_point_pass_good", TwoPointAttempt, Guard::all(&["pass attempt"]).or(&["successful", "good"]), PASS_ATTEMPT, fx::conversion_good),
    rule!("two_point_rush_failed", TwoPointAttempt, Guard::all(&["rush attempt"]).or(CONVERSION_FAILED), RUSH_ATTEMPT, fx::conversion_failed),
    rule!("two_point_rush_good", TwoPointAttempt, Guard::all(&["rush attempt"]).or(&["successful", "good"]), RUSH_ATTEMPT, fx::conversion_good),
    // Rushes.
    rule!("kneel", RushAttempt, Guard::any_of(&["kneel", "kneels"]), KNEEL, fx::kneel),
    rule!("rush_fumble", RushAttempt, Guard::all(&["rush", "fumble*"]), RUSH, fx::rush),
    rule!("rush_touchdown", RushAttempt, Guard::all(&["rush", "touchdown"]), RUSH, fx::rush),
    rule!("rush_out_of_bounds", RushAttempt, Guard::all(&["rush"]).or(OUT_OF_BOUNDS), RUSH, fx::rush),
    rule!("rush", RushAttempt, Guard::all(&["rush"]), RUSH, fx::rush),
    // Kickoffs.
    rule!("onside_kick", Kickoff, Guard::all(&["kick*"]).or(&["onside", "on-side"]).but_not(&["kick attempt"]), KICKOFF, fx::kickoff),
    rule!("kickoff_fumble", Kickoff, Guard::all(&["kickoff"]).or(&["fumble*", "muff*"]), KICKOFF, fx::kickoff),
    rule!("kickoff_touchdown", Kickoff, Guard::all(&["kickoff", "touchdown"]), KICKOFF, fx::kickoff),
    rule!("kickoff_touchback", Kickoff, Guard::all(&["kickoff", "touchback"]), KICKOFF, fx::kickoff),
    rule!("kickoff_fair_catch", Kickoff, Guard::all(&["kickoff", "fair catch"]), KICKOFF, fx::kickoff),
    rule!("kickoff_out_of_bounds", Kickoff, Guard::all(&["kickoff"]).or(OUT_OF_BOUNDS).but_not(&[" return"]), KICKOFF, fx::kickoff),
    rule!("kickoff_return", Kickoff, Guard::all(&["kickoff", " return"]), KICKOFF, fx::kickoff),
    rule!("kickoff", Kickoff, Guard::all(&["kickoff"]), KICKOFF, fx::kickoff),
    // Place kicks.
    rule!("extra_point", ExtraPointAttempt, Guard::all(&["kick attempt"]), EXTRA_POINT, fx::extra_point),
    rule!("field_goal", FieldGoalAttempt, Guard::all(&["field goal attempt"]), FIELD_GOAL, fx::field_goal),
    // Punts.
    rule!("punt_blocked", Punt, Guard::all(&["punt", "blocked"]), PUNT, fx::punt),
    rule!("punt_fumble", Punt, Guard::all(&["punt"]).or(&["fumble*", "muff*"]), PUNT, fx::punt),
    rule!("punt_touchdown", Punt, Guard::all(&["punt", "touchdown"]), PUNT, fx::punt),
    rule!("punt_touchback", Punt, Guard::all(&["punt", "touchback"]), PUNT, fx::punt),
    rule!("punt_fair_catch", Punt, Guard::all(&["punt", "fair catch"]), PUNT, fx::punt),
    rule!("punt_downed", Punt, Guard::all(&["punt", "downed"]), PUNT, fx::punt),
    rule!("punt_out_of_bounds", Punt, Guard::all(&["punt"]).or(OUT_OF_BOUNDS), PUNT, fx::punt),
    rule!("punt_return", Punt, Guard::all(&["punt", " return"]), PUNT, fx::punt),
    rule!("punt", Punt, Guard::all(&["punt"]), PUNT, fx::punt),
    // Stoppages and bookkeeping.
    rule!("penalty", Penalty, Guard::all(&["penalty"]), r"(?i)penalty", fx::none),
    rule!("injury_timeout", Timeout, Guard::all(&["injury timeout"]), r"(?i)injury timeout", fx::injury_timeout),
    rule!("timeout", Timeout, Guard::all(&["timeout"]), r"(?i:timeout) (?P<team>[#A-Za-z0-9&.' ]+?)(?:,? (?i:clock) \d{1,2}:\d{2})?\.?$", fx::team_line),
    rule!("ball_on", Administrative, Guard::all(&["ball on"]), r"(?i)ball on (?:the )?(?P<end>{SPOT})", fx::ball_on),
    rule!("at_quarterback", Administrative, Guard::all(&["at qb for"]), r"(?i)at qb for", fx::none),
    rule!("down_and_distance", Administrative, Guard::shape(r"^\s*[1-4](?:st|nd|rd|th) (?:and|&) (?:\d{1,2}|goal)\.?\s*$"), r".+", fx::none),
    rule!("clock", Administrative, Guard::shape(r"^\s*clock \d{1,2}:\d{2}\.?\s*$"), r".+", fx::none),
];

pub static FOOTBALL_RULES: Lazy<RuleTable<FootballKind, FootballFields, SnapContext>> =
    Lazy::new(|| RuleTable::compile(RULES, FRAGMENTS).expect("football rule patterns compile"));

/// Play text with formation and status markers lifted out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scrubbed {
    pub text: String,
    pub shotgun: bool,
    pub no_huddle: bool,
    pub first_down: bool,
    pub no_play: bool,
    pub qb_hurried_by: Option<String>,
}

static FORMATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:shotgun|no huddle)(?:\s*-\s*(?:shotgun|no huddle))?\b[\s,]*")
        .expect("formation pattern compiles")
});

static QB_HURRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r",?\s*\(?(?i:qb hurried by) (?P<who>{NAME})\)?"))
        .expect("hurry pattern compiles")
});

static FIRST_DOWN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i),?\s*\b(?:1st|first) down\b(?:\s+(?-i:[A-Z&]{2,8})\b)?\.?")
        .expect("first down pattern compiles")
});

static CONVERSION_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)two-point conversion attempt[,:]?\s*").expect("conversion pattern compiles")
});

static MIDFIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b50 yardline\b").expect("midfield pattern compiles"));

pub fn scrub(raw: &str) -> Scrubbed {
    let mut out = Scrubbed::default();
    let mut text = raw.to_string();

    for found in FORMATION.find_iter(raw) {
        let lower = found.as_str().to_lowercase();
        out.shotgun |= lower.contains("shotgun");
        out.no_huddle |= lower.contains("no huddle");
    }
    text = FORMATION.replace_all(&text, "").into_owned();

    if let Some(caps) = QB_HURRY.captures(&text) {
        out.qb_hurried_by = Some(caps["who"].trim().to_string());
        text = QB_HURRY.replace(&text, "").into_owned();
    }
    if FIRST_DOWN.is_match(&text) {
        out.first_down = true;
        text = FIRST_DOWN.replace_all(&text, "").into_owned();
    }
    text = CONVERSION_PREFIX.replace(&text, "").into_owned();
    text = MIDFIELD.replace_all(&text, "50").into_owned();

    out.no_play = text.to_lowercase().contains("no play");
    out.text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    out
}

/// A classified and extracted football line.
#[derive(Debug, Clone)]
pub struct ParsedLine {
    pub matched: Matched<FootballKind>,
    pub fields: FootballFields,
}

/// Kind for a line, `Unrecognized` when no rule fires.
pub fn classify(raw: &str, ctx: &SnapContext) -> FootballKind {
    let scrubbed = scrub(raw);
    match FOOTBALL_RULES.classify(&scrubbed.text) {
        Some(matched) => {
            trace!(rule = matched.name, possession = ?ctx.possession, "football rule fired");
            matched.kind
        }
        None => FootballKind::Unrecognized,
    }
}

/// Classifies, extracts and layers the shared clauses onto one line.
pub fn parse_line(raw: &str, ctx: &SnapContext) -> Result<ParsedLine, ParseError> {
    let scrubbed = scrub(raw);
    let matched = FOOTBALL_RULES
        .classify(&scrubbed.text)
        .ok_or_else(|| ParseError::ClassificationGap {
            text: raw.to_string(),
        })?;
    trace!(rule = matched.name, possession = ?ctx.possession, "football rule fired");
    let fields = FOOTBALL_RULES.extract(&matched, &scrubbed.text, ctx)?;
    let fields = fx::finish(fields, matched.kind, &scrubbed, ctx)
        .map_err(|err| err.into_parse(matched.name, raw))?;
    Ok(ParsedLine { matched, fields })
}

#[cfg(test)]
mod tests {
    use super::{FOOTBALL_RULES, scrub};

    #[test]
    fn table_compiles_with_unique_names() {
        let names: Vec<_> = FOOTBALL_RULES.names().collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(names.len(), sorted.len());
    }

    #[test]
    fn specific_rules_precede_plain_ones() {
        for (specific, plain) in [
            ("pass_complete_touchdown", "pass_complete"),
            ("pass_complete_fumble", "pass_complete_touchdown"),
            ("rush_fumble", "rush_touchdown"),
            ("two_point_pass_failed", "two_point_pass_good"),
            ("two_point_rush_good", "rush"),
            ("interception_return", "interception"),
            ("kickoff_touchback", "kickoff"),
            ("punt_return", "punt"),
            ("no_play_penalty", "pass_incomplete"),
        ] {
            let specific_at = FOOTBALL_RULES.position(specific).expect("rule exists");
            let plain_at = FOOTBALL_RULES.position(plain).expect("rule exists");
            assert!(specific_at < plain_at, "{specific} must precede {plain}");
        }
    }

    #[test]
    fn scrub_lifts_markers() {
        let out = scrub("Shotgun-No Huddle J. Smith rush for 12 yards to the DUKE40, 1ST DOWN UNC.");
        assert!(out.shotgun && out.no_huddle && out.first_down);
        assert_eq!(out.text, "J. Smith rush for 12 yards to the DUKE40");

        let out = scrub("J. Smith pass incomplete to T. Jones (QB hurried by D. Ross)");
        assert_eq!(out.qb_hurried_by.as_deref(), Some("D. Ross"));
        assert_eq!(out.text, "J. Smith pass incomplete to T. Jones");

        let out = scrub("TWO-POINT CONVERSION ATTEMPT, J. Smith rush attempt successful.");
        assert_eq!(out.text, "J. Smith rush attempt successful.");
        assert_eq!(scrub("ball on 50 yardline").text, "ball on 50");
    }
}
