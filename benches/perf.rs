use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use ncaa_pbp::football_extract::SnapContext;
use ncaa_pbp::football_rules;
use ncaa_pbp::football_state::Football;
use ncaa_pbp::pipeline::{build_pool, transduce, transduce_batch};
use ncaa_pbp::play::{Contest, Side};
use ncaa_pbp::synthetic::{football_game, volleyball_match};
use ncaa_pbp::volleyball_rules;
use ncaa_pbp::volleyball_state::Volleyball;
use ncaa_pbp::yardline::FieldFrame;

#[derive(serde::Deserialize)]
struct LineCase {
    text: String,
}

fn lines(raw: &str) -> Vec<String> {
    serde_json::from_str::<Vec<LineCase>>(raw)
        .unwrap()
        .into_iter()
        .map(|case| case.text)
        .collect()
}

fn bench_football_classify(c: &mut Criterion) {
    let lines = lines(FOOTBALL_LINES_JSON);
    let ctx = SnapContext {
        possession: Side::Home,
        frame: FieldFrame::new("UNC", "DUKE"),
        scrimmage: Some(25),
    };
    c.bench_function("football_parse_lines", |b| {
        b.iter(|| {
            for line in &lines {
                let parsed = football_rules::parse_line(black_box(line), &ctx).unwrap();
                black_box(parsed.matched.index);
            }
        })
    });
}

fn bench_volleyball_classify(c: &mut Criterion) {
    let lines = lines(VOLLEYBALL_LINES_JSON);
    c.bench_function("volleyball_parse_lines", |b| {
        b.iter(|| {
            for line in &lines {
                let parsed = volleyball_rules::parse_line(black_box(line)).unwrap();
                black_box(parsed.matched.index);
            }
        })
    });
}

fn bench_football_contest(c: &mut Criterion) {
    let contest: Contest = serde_json::from_str(FOOTBALL_CONTEST_JSON).unwrap();
    let synthetic = football_game(11, 1).contest;
    c.bench_function("football_fixture_contest", |b| {
        b.iter(|| {
            let records = transduce::<Football>(black_box(&contest)).unwrap();
            black_box(records.len());
        })
    });
    c.bench_function("football_synthetic_game", |b| {
        b.iter(|| {
            let records = transduce::<Football>(black_box(&synthetic)).unwrap();
            black_box(records.len());
        })
    });
}

fn bench_volleyball_batch(c: &mut Criterion) {
    let contests: Vec<Contest> = (0..64).map(|idx| volleyball_match(idx, idx + 1).contest).collect();
    let serial = build_pool(1);
    let pool = build_pool(4);
    c.bench_function("volleyball_batch_serial", |b| {
        b.iter(|| {
            let results = transduce_batch::<Volleyball>(black_box(&contests), &serial);
            black_box(results.len());
        })
    });
    c.bench_function("volleyball_batch_pool4", |b| {
        b.iter(|| {
            let results = transduce_batch::<Volleyball>(black_box(&contests), &pool);
            black_box(results.len());
        })
    });
}

criterion_group!(
    perf,
    bench_football_classify,
    bench_volleyball_classify,
    bench_football_contest,
    bench_volleyball_batch
);
criterion_main!(perf);

static FOOTBALL_LINES_JSON: &str = include_str!("../tests/fixtures/football_lines.json");
static VOLLEYBALL_LINES_JSON: &str = include_str!("../tests/fixtures/volleyball_lines.json");
static FOOTBALL_CONTEST_JSON: &str = include_str!("../tests/fixtures/football_contest.json");
