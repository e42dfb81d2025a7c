use std::fs;
use std::path::PathBuf;

use ncaa_pbp::error::ParseError;
use ncaa_pbp::football_extract::{ConversionResult, KickResult, SnapContext};
use ncaa_pbp::football_state::points;
use ncaa_pbp::football_rules::{FOOTBALL_RULES, FootballKind, classify, parse_line};
use ncaa_pbp::play::Side;
use ncaa_pbp::yardline::FieldFrame;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[derive(Debug, serde::Deserialize)]
struct LineCase {
    text: String,
    kind: String,
    rule: String,
}

fn unc_ball() -> SnapContext {
    SnapContext {
        possession: Side::Home,
        frame: FieldFrame::new("UNC", "DUKE"),
        scrimmage: Some(25),
    }
}

#[test]
fn curated_lines_hit_their_rules() {
    let raw = read_fixture("football_lines.json");
    let cases: Vec<LineCase> = serde_json::from_str(&raw).expect("fixture should parse");
    assert!(cases.len() > 30);
    let ctx = unc_ball();
    for case in &cases {
        let parsed = parse_line(&case.text, &ctx)
            .unwrap_or_else(|err| panic!("`{}` failed: {err}", case.text));
        let kind = serde_json::to_value(parsed.matched.kind).expect("kind serializes");
        assert_eq!(kind, serde_json::Value::String(case.kind.clone()), "kind for `{}`", case.text);
        assert_eq!(parsed.matched.name, case.rule, "rule for `{}`", case.text);
    }
}

#[test]
fn touchdown_completion_credits_the_receiver() {
    let parsed = parse_line(
        "J. Smith pass complete to T. Jones for 12 yards to the 35, TOUCHDOWN",
        &unc_ball(),
    )
    .expect("line parses");
    assert_eq!(parsed.matched.kind, FootballKind::PassComplete);
    assert!(parsed.fields.is_touchdown());
    assert_eq!(parsed.fields.receiving_yards, Some(12));
    assert_eq!(parsed.fields.receiver.as_deref(), Some("T. Jones"));
    assert_eq!(parsed.fields.touchdown_side, Some(Side::Home));
    // A bare marker other than midfield names no half.
    assert_eq!(parsed.fields.end_spot, None);
}

#[test]
fn sack_reports_negative_yardage() {
    let parsed = parse_line("J. Smith sacked for loss of 7 yards to the 22 (A. Lee)", &unc_ball())
        .expect("line parses");
    assert_eq!(parsed.matched.kind, FootballKind::Sack);
    assert_eq!(parsed.fields.yards_gained, Some(-7));
    assert_eq!(parsed.fields.sackers.first(), Some("A. Lee"));
    assert!(!parsed.fields.sackers.is_shared());
}

#[test]
fn air_yards_and_yards_after_catch_use_the_scrimmage_line() {
    let parsed = parse_line(
        "J. Smith pass complete short middle to T. Jones, caught at the UNC31, for 15 yards to the UNC40 (K. Hill; D. Ross)",
        &unc_ball(),
    )
    .expect("line parses");
    assert_eq!(parsed.fields.target_spot, Some(31));
    assert_eq!(parsed.fields.air_yards, Some(6));
    assert_eq!(parsed.fields.yards_after_catch, Some(9));
    assert_eq!(parsed.fields.end_spot, Some(40));
    assert!(parsed.fields.tacklers.is_shared());
    assert_eq!(parsed.fields.pass_length.as_deref(), Some("short"));
}

#[test]
fn spots_resolve_against_the_possessing_team() {
    let parsed = parse_line(
        "J. Smith pass intercepted by K. Hill at the DUKE40, K. Hill return for 15 yards to the UNC45",
        &unc_ball(),
    )
    .expect("line parses");
    assert_eq!(parsed.fields.target_spot, Some(60));
    assert_eq!(parsed.fields.end_spot, Some(45));
    assert_eq!(parsed.fields.return_yards, Some(15));
    assert_eq!(parsed.fields.yards_gained, None);
}

#[test]
fn scrubbed_markers_become_flags() {
    let parsed = parse_line(
        "Shotgun J. Smith pass complete deep left to T. Jones for 18 yards to the UNC43, 1ST DOWN UNC (K. Hill)",
        &unc_ball(),
    )
    .expect("line parses");
    assert!(parsed.fields.flags.shotgun);
    assert!(parsed.fields.flags.first_down);
    assert!(!parsed.fields.flags.no_huddle);
    assert_eq!(parsed.fields.pass_location.as_deref(), Some("left"));
}

#[test]
fn kick_results_and_credits() {
    let ctx = unc_ball();
    let fg = parse_line(
        "R. Owens field goal attempt from 27 yards good (H: C. Diaz, LS: B. Carter)",
        &ctx,
    )
    .expect("line parses");
    assert_eq!(fg.fields.kick_result, Some(KickResult::Good));
    assert_eq!(fg.fields.kick_distance, Some(27));
    assert_eq!(fg.fields.holder.as_deref(), Some("C. Diaz"));
    assert_eq!(fg.fields.long_snapper.as_deref(), Some("B. Carter"));

    let miss = parse_line("R. Owens field goal attempt from 42 yards no good", &ctx).expect("line parses");
    assert_eq!(miss.fields.kick_result, Some(KickResult::NoGood));
}

#[test]
fn fumbles_track_the_recovering_team() {
    let parsed = parse_line(
        "T. Brown rush for 3 yards to the UNC28, fumbled by T. Brown, forced by K. Hill, recovered by DUKE M. Lee at the UNC28",
        &unc_ball(),
    )
    .expect("line parses");
    assert_eq!(parsed.matched.name, "rush_fumble");
    let fumble = parsed.fields.fumble.expect("fumble details");
    assert_eq!(fumble.fumbler.as_deref(), Some("T. Brown"));
    assert_eq!(fumble.forced_by.as_deref(), Some("K. Hill"));
    assert_eq!(fumble.recovered_by_team.as_deref(), Some("DUKE"));
    assert!(fumble.lost);
}

#[test]
fn rush_without_yardage_measures_from_the_line_of_scrimmage() {
    let parsed = parse_line(
        "T. Brown rush to the DUKE30, fumble forced by K. Hill, fumble by T. Brown recovered by DUKE M. Lee at DUKE30.",
        &unc_ball(),
    )
    .expect("line parses");
    assert_eq!(parsed.matched.name, "rush_fumble");
    assert_eq!(parsed.fields.end_spot, Some(70));
    assert_eq!(parsed.fields.yards_gained, Some(45));
    assert_eq!(parsed.fields.rushing_yards, Some(45));
    let fumble = parsed.fields.fumble.expect("fumble details");
    assert_eq!(fumble.forced_by.as_deref(), Some("K. Hill"));
    assert_eq!(fumble.recovered_by.as_deref(), Some("M. Lee"));
    assert!(fumble.lost);

    let unknown_scrimmage = SnapContext {
        scrimmage: None,
        ..unc_ball()
    };
    let err = parse_line(
        "T. Brown rush to the DUKE30, fumble by T. Brown recovered by DUKE M. Lee at DUKE30.",
        &unknown_scrimmage,
    )
    .expect_err("no way to measure the gain");
    assert!(matches!(err, ParseError::ExtractionMismatch { rule: "rush_fumble", .. }));
}

#[test]
fn guard_phrases_ignore_words_inside_names() {
    let ctx = unc_ball();
    let punt = parse_line("J. Brush punt 40 yards to the DUKE20, downed", &ctx).expect("line parses");
    assert_eq!(punt.matched.kind, FootballKind::Punt);
    assert_eq!(punt.fields.punter.as_deref(), Some("J. Brush"));

    let run = parse_line("B. Kneeland rush for 3 yards to the UNC28", &ctx).expect("line parses");
    assert_eq!(run.matched.name, "rush");
    assert!(!run.fields.flags.kneel);

    // No result word, so this must not be read as a successful try.
    let err = parse_line("T. Goodwin rush attempt", &ctx).expect_err("no yardage and no result");
    assert!(matches!(err, ParseError::ExtractionMismatch { rule: "rush", .. }));

    let good = parse_line("TWO-POINT CONVERSION ATTEMPT, T. Goodwin rush attempt successful", &ctx)
        .expect("line parses");
    assert_eq!(good.matched.name, "two_point_rush_good");
    assert_eq!(good.fields.conversion, Some(ConversionResult::Success));
    assert_eq!(good.fields.rusher.as_deref(), Some("T. Goodwin"));
}

#[test]
fn lowercase_name_particles_stay_with_the_name() {
    let ctx = unc_ball();
    let run = parse_line("J. de Leon rush for 5 yards to the UNC30", &ctx).expect("line parses");
    assert_eq!(run.fields.rusher.as_deref(), Some("J. de Leon"));
    let pass = parse_line("J. van der Berg pass complete to T. Jones for 9 yards to the UNC34", &ctx)
        .expect("line parses");
    assert_eq!(pass.fields.passer.as_deref(), Some("J. van der Berg"));
    assert_eq!(pass.fields.receiver.as_deref(), Some("T. Jones"));
}

#[test]
fn safety_credits_the_defense() {
    let parsed = parse_line("T. Brown rush for loss of 3 yards to the UNC0, SAFETY", &unc_ball())
        .expect("line parses");
    assert!(parsed.fields.flags.safety);
    assert_eq!(parsed.fields.safety_side, Some(Side::Away));
    assert_eq!(
        points(parsed.matched.kind, &parsed.fields, Side::Home),
        Some((Side::Away, 2))
    );
}

#[test]
fn penalties_are_parsed_on_any_line() {
    let parsed = parse_line(
        "PENALTY DUKE offside (K. Hill) 5 yards from the UNC25 to the UNC30, NO PLAY",
        &unc_ball(),
    )
    .expect("line parses");
    assert!(parsed.fields.flags.no_play);
    let penalty = parsed.fields.penalty.expect("penalty clause");
    assert_eq!(penalty.side, Some(Side::Away));
    assert_eq!(penalty.yards, Some(5));
    assert_eq!(penalty.to_spot, Some(30));
    assert_eq!(penalty.player.as_deref(), Some("K. Hill"));

    let err = parse_line("PENALTY something odd happened", &unc_ball()).expect_err("clause is malformed");
    assert!(matches!(err, ParseError::ExtractionMismatch { rule: "penalty", .. }));
}

#[test]
fn unknown_text_is_a_gap_not_a_default() {
    let ctx = unc_ball();
    assert_eq!(classify("The band takes the field", &ctx), FootballKind::Unrecognized);
    let err = parse_line("The band takes the field", &ctx).expect_err("no rule matches");
    assert_eq!(
        err,
        ParseError::ClassificationGap {
            text: "The band takes the field".to_string()
        }
    );
}

#[test]
fn out_of_range_numbers_are_numeric_failures() {
    let err = parse_line("R. Owens kickoff 300 yards to the DUKE0, touchback", &unc_ball())
        .expect_err("distance overflows");
    assert!(matches!(
        err,
        ParseError::NumericParseFailure { field: "distance", .. }
    ));
}

#[test]
fn rule_table_is_inspectable() {
    let names: Vec<_> = FOOTBALL_RULES.names().collect();
    assert_eq!(names.len(), FOOTBALL_RULES.len());
    let td = names.iter().position(|n| *n == "pass_complete_touchdown").expect("rule exists");
    let plain = names.iter().position(|n| *n == "pass_complete").expect("rule exists");
    assert!(td < plain);
}
