//! Seeded synthetic contests for demos, property tests and benches.
//!
//! Each generator also reports the result it wrote into the text, so a
//! transduced contest can be checked against what was generated.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::play::{Contest, ContestMeta, RawPlay, ScorePair, Side, TeamRef};

const TEAMS: &[(&str, &str)] = &[
    ("North Carolina", "UNC"),
    ("Duke", "DUKE"),
    ("Wake Forest", "WAKE"),
    ("Virginia", "UVA"),
    ("Clemson", "CLEM"),
    ("Stanford", "STAN"),
    ("Nebraska", "NEB"),
    ("Texas", "TEX"),
];

const FIRST: &[&str] = &["J.", "T.", "M.", "A.", "D.", "K.", "R.", "C."];
const LAST: &[&str] = &["Smith", "Jones", "Carter", "Lee", "Owens", "Hill", "Brooks", "Diaz"];

const VB_LAST: &[&str] = &["Smith", "Doe", "Lee", "Park", "Nguyen", "Ortiz", "Reyes", "Kim"];
const VB_FIRST: &[&str] = &["Jane", "Ann", "Mia", "Zoe", "Ava", "Eve", "Ivy", "Liz"];

/// A generated contest and the result its text implies.
#[derive(Debug, Clone)]
pub struct Synthetic {
    pub contest: Contest,
    /// Final points in football, sets won in volleyball.
    pub result: ScorePair,
}

fn meta(rng: &mut StdRng, contest_id: u64) -> Arc<ContestMeta> {
    let home = rng.gen_range(0..TEAMS.len());
    let mut away = rng.gen_range(0..TEAMS.len() - 1);
    if away >= home {
        away += 1;
    }
    let team = |idx: usize| TeamRef {
        id: idx as u32 + 1,
        name: TEAMS[idx].0.to_string(),
        abbr: TEAMS[idx].1.to_string(),
    };
    Arc::new(ContestMeta {
        contest_id,
        season: 2024,
        home: team(home),
        away: team(away),
        venue: None,
        attendance: rng.gen_bool(0.5).then(|| rng.gen_range(1_000..60_000)),
        scheduled: None,
    })
}

fn person(rng: &mut StdRng) -> String {
    format!(
        "{} {}",
        FIRST[rng.gen_range(0..FIRST.len())],
        LAST[rng.gen_range(0..LAST.len())]
    )
}

fn vb_person(rng: &mut StdRng) -> String {
    format!(
        "{},{}",
        VB_LAST[rng.gen_range(0..VB_LAST.len())],
        VB_FIRST[rng.gen_range(0..VB_FIRST.len())]
    )
}

fn ordinal(n: u8) -> &'static str {
    match n {
        1 => "1st",
        2 => "2nd",
        3 => "3rd",
        4 => "4th",
        _ => "5th",
    }
}

/// A marker such as `UNC25`, `DUKE40` or `50` for an absolute spot.
fn marker(offense: &str, defense: &str, spot: u8) -> String {
    match spot {
        50 => "50".to_string(),
        s if s < 50 => format!("{offense}{s}"),
        s => format!("{defense}{}", 100 - s),
    }
}

struct Writer {
    plays: Vec<RawPlay>,
    period: u8,
}

impl Writer {
    fn push(&mut self, side: Side, text: String, situation: Option<String>) {
        let sequence = self.plays.len() as u32 + 1;
        let mut play = RawPlay::new(sequence, self.period, side, text);
        play.situation = situation;
        self.plays.push(play);
    }
}

const FOOTBALL_PLAYS_PER_QUARTER: usize = 30;

/// A four-quarter game of rushes, passes, punts, field goals and touchdowns.
pub fn football_game(seed: u64, contest_id: u64) -> Synthetic {
    let mut rng = StdRng::seed_from_u64(seed);
    let meta = meta(&mut rng, contest_id);
    let abbr = |side: Side| meta.team(side).abbr.clone();

    let mut out = Writer {
        plays: Vec::new(),
        period: 1,
    };
    let mut score = ScorePair::default();
    let mut offense = if rng.gen_bool(0.5) { Side::Home } else { Side::Away };
    let mut kick_next = true;
    let (mut spot, mut down, mut distance) = (25u8, 1u8, 10u8);
    let mut snaps = 0usize;

    out.push(offense, "Start of 1st quarter".to_string(), None);
    while out.period <= 4 {
        let (off, def) = (abbr(offense), abbr(offense.other()));

        if kick_next {
            // The kicking team is listed as the side for a kickoff.
            let kicker = offense.other();
            let returner = person(&mut rng);
            let ret = rng.gen_range(15..30u8);
            out.push(
                kicker,
                format!(
                    "{} kickoff 62 yards to the {off}3, {returner} return for {ret} yards to the {off}{}",
                    person(&mut rng),
                    3 + ret
                ),
                None,
            );
            (spot, down, distance) = (3 + ret, 1, 10);
            kick_next = false;
            continue;
        }

        let to_go = 100 - spot;
        let situation = if distance >= to_go {
            format!("{} & Goal at {}", ordinal(down), marker(&off, &def, spot))
        } else {
            format!("{} & {distance} at {}", ordinal(down), marker(&off, &def, spot))
        };

        snaps += 1;
        if snaps > FOOTBALL_PLAYS_PER_QUARTER {
            snaps = 0;
            out.period += 1;
            if out.period <= 4 {
                out.push(offense, format!("Start of {} quarter", ordinal(out.period)), None);
            }
            continue;
        }

        if down == 4 {
            if spot >= 60 {
                let good = rng.gen_bool(0.8);
                out.push(
                    offense,
                    format!(
                        "{} field goal attempt from {} yards {}",
                        person(&mut rng),
                        to_go + 17,
                        if good { "good" } else { "no good" }
                    ),
                    Some(situation),
                );
                if good {
                    add(&mut score, offense, 3);
                    kick_next = true;
                } else {
                    (spot, down, distance) = (100 - spot, 1, 10);
                }
            } else {
                let length = rng.gen_range(30..=45u8).min(95 - spot);
                let land = spot + length;
                out.push(
                    offense,
                    format!(
                        "{} punt {length} yards to the {}, fair catch",
                        person(&mut rng),
                        marker(&off, &def, land)
                    ),
                    Some(situation),
                );
                (spot, down, distance) = (100 - land, 1, 10);
            }
            offense = offense.other();
            continue;
        }

        let passer = person(&mut rng);
        let roll = rng.gen_range(0..100u8);
        if roll < 15 {
            out.push(
                offense,
                format!("{passer} pass incomplete to {}", person(&mut rng)),
                Some(situation),
            );
            down += 1;
            continue;
        }

        let gain: i16 = if roll < 55 {
            rng.gen_range(-3..=12)
        } else {
            rng.gen_range(1..=25)
        };
        // No safeties in generated games.
        let gain = gain.max(1 - spot as i16);
        let landed = spot as i16 + gain;
        let actor = if roll < 55 {
            format!("{} rush", person(&mut rng))
        } else {
            format!("{passer} pass complete to {}", person(&mut rng))
        };

        if landed >= 100 {
            out.push(
                offense,
                format!("{actor} for {to_go} yards, TOUCHDOWN"),
                Some(situation),
            );
            let kicker = person(&mut rng);
            out.push(offense, format!("{kicker} kick attempt good"), None);
            add(&mut score, offense, 7);
            kick_next = true;
            offense = offense.other();
            continue;
        }

        let landed = landed as u8;
        let yards = match gain {
            0 => "no gain".to_string(),
            g if g < 0 => format!("loss of {} yards", -g),
            g => format!("{g} yards"),
        };
        let moved_chains = gain >= distance as i16;
        let suffix = if moved_chains {
            format!(", 1ST DOWN {off}")
        } else {
            String::new()
        };
        out.push(
            offense,
            format!("{actor} for {yards} to the {}{suffix}", marker(&off, &def, landed)),
            Some(situation),
        );
        spot = landed;
        if moved_chains {
            (down, distance) = (1, 10);
        } else {
            down += 1;
            distance = (distance as i16 - gain).clamp(1, 99) as u8;
        }
    }
    out.period = 4;
    out.push(offense, "End of game".to_string(), None);

    Synthetic {
        contest: Contest {
            meta,
            plays: out.plays,
        },
        result: score,
    }
}

fn add(score: &mut ScorePair, side: Side, points: u16) {
    match side {
        Side::Home => score.home += points,
        Side::Away => score.away += points,
    }
}

/// A best-of-five match. Sets go to 25, the fifth to 15, win by two.
pub fn volleyball_match(seed: u64, contest_id: u64) -> Synthetic {
    let mut rng = StdRng::seed_from_u64(seed);
    let meta = meta(&mut rng, contest_id);
    let mut out = Writer {
        plays: Vec::new(),
        period: 1,
    };
    let mut sets = ScorePair::default();

    for set in 1..=5u8 {
        out.period = set;
        let target: u16 = if set == 5 { 15 } else { 25 };
        for side in [Side::Home, Side::Away] {
            let names: Vec<String> = (0..6).map(|_| vb_person(&mut rng)).collect();
            out.push(
                side,
                format!("{} starters: {}.", meta.team(side).abbr, names.join("; ")),
                None,
            );
        }

        let mut running = ScorePair::default();
        let mut serving = if set % 2 == 1 { Side::Home } else { Side::Away };
        loop {
            let server = vb_person(&mut rng);
            out.push(serving, format!("{server} serves"), None);
            let winner = if rng.gen_bool(0.5) { Side::Home } else { Side::Away };
            add(&mut running, winner, 1);

            let roll = rng.gen_range(0..100u8);
            let (side, text) = if roll < 8 && winner == serving {
                (
                    serving,
                    format!("Point {}: ({server}) Service ace.", meta.team(serving).abbr),
                )
            } else if roll < 16 && winner != serving {
                (serving, format!("{server} service error"))
            } else if roll < 40 {
                (winner.other(), format!("Attack error by {}.", vb_person(&mut rng)))
            } else {
                out.push(
                    winner.other(),
                    format!("Reception by {}.", vb_person(&mut rng)),
                    None,
                );
                let hitter = vb_person(&mut rng);
                let setter = vb_person(&mut rng);
                (winner, format!("Kill by {hitter} (from {setter})."))
            };
            out.push(side, text, None);
            if let Some(last) = out.plays.last_mut() {
                last.score = Some(running);
            }
            serving = winner;

            if rng.gen_bool(0.03) {
                out.push(winner.other(), format!("Timeout {}.", meta.team(winner.other()).abbr), None);
            }

            let (lead, trail) = (running.get(winner), running.get(winner.other()));
            if lead >= target && lead - trail >= 2 {
                out.push(winner, "END SET".to_string(), None);
                add(&mut sets, winner, 1);
                break;
            }
        }
        if sets.home == 3 || sets.away == 3 {
            break;
        }
    }
    out.push(Side::Home, "END MATCH".to_string(), None);

    Synthetic {
        contest: Contest {
            meta,
            plays: out.plays,
        },
        result: sets,
    }
}

#[cfg(test)]
mod tests {
    use super::{football_game, marker, volleyball_match};

    #[test]
    fn markers_use_the_owning_half() {
        assert_eq!(marker("UNC", "DUKE", 25), "UNC25");
        assert_eq!(marker("UNC", "DUKE", 50), "50");
        assert_eq!(marker("UNC", "DUKE", 70), "DUKE30");
    }

    #[test]
    fn generation_is_seeded() {
        let a = volleyball_match(7, 1);
        let b = volleyball_match(7, 1);
        assert_eq!(a.contest.plays, b.contest.plays);
        assert!(a.result.home == 3 || a.result.away == 3);

        let game = football_game(7, 2);
        let sequences: Vec<u32> = game.contest.plays.iter().map(|p| p.sequence).collect();
        assert!(sequences.windows(2).all(|w| w[0] < w[1]));
    }
}
