use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, bail};
use serde::Serialize;
use tracing::info;

use ncaa_pbp::config::Settings;
use ncaa_pbp::football_state::Football;
use ncaa_pbp::logging;
use ncaa_pbp::pipeline::{self, BatchOutcome, Sport};
use ncaa_pbp::play::Contest;
use ncaa_pbp::synthetic;
use ncaa_pbp::volleyball_state::Volleyball;

const USAGE: &str = "usage: ncaa_pbp --sport football|volleyball (--input FILE.json | --synthetic N) [--seed S] [--parallelism N] [--pretty]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SportArg {
    Football,
    Volleyball,
}

#[derive(Debug)]
struct Args {
    sport: SportArg,
    input: Option<PathBuf>,
    synthetic: Option<usize>,
    seed: u64,
    parallelism: Option<usize>,
    pretty: bool,
}

/// `--name=value` or `--name value`.
fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn parse_args(args: &[String]) -> anyhow::Result<Args> {
    let sport = match arg_value(args, "--sport").as_deref() {
        Some("football") => SportArg::Football,
        Some("volleyball") => SportArg::Volleyball,
        Some(other) => bail!("unknown sport `{other}`\n{USAGE}"),
        None => bail!("missing --sport\n{USAGE}"),
    };
    let number = |name: &str| -> anyhow::Result<Option<u64>> {
        arg_value(args, name)
            .map(|raw| {
                raw.parse::<u64>()
                    .with_context(|| format!("{name} expects a number, got `{raw}`"))
            })
            .transpose()
    };
    let parsed = Args {
        sport,
        input: arg_value(args, "--input").map(PathBuf::from),
        synthetic: number("--synthetic")?.map(|n| n as usize),
        seed: number("--seed")?.unwrap_or(0),
        parallelism: number("--parallelism")?.map(|n| n as usize),
        pretty: args.iter().any(|arg| arg == "--pretty"),
    };
    if parsed.input.is_none() && parsed.synthetic.is_none() {
        bail!("one of --input or --synthetic is required\n{USAGE}");
    }
    Ok(parsed)
}

fn load_contests(args: &Args) -> anyhow::Result<Vec<Contest>> {
    if let Some(path) = &args.input {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        // Either a list of contests or a single contest object.
        return serde_json::from_str::<Vec<Contest>>(&raw)
            .or_else(|_| serde_json::from_str::<Contest>(&raw).map(|c| vec![c]))
            .with_context(|| format!("parsing {}", path.display()));
    }
    let count = args.synthetic.unwrap_or(0);
    let generate: fn(u64, u64) -> synthetic::Synthetic = match args.sport {
        SportArg::Football => synthetic::football_game,
        SportArg::Volleyball => synthetic::volleyball_match,
    };
    Ok((0..count)
        .map(|idx| generate(args.seed.wrapping_add(idx as u64), idx as u64 + 1).contest)
        .collect())
}

fn emit<T: Serialize>(out: &mut impl Write, value: &T, pretty: bool) -> anyhow::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

#[derive(Debug, Default)]
struct Summary {
    parsed: usize,
    unparsed: usize,
    skipped: usize,
    records: usize,
}

fn run<S: Sport>(contests: &[Contest], settings: &Settings, pretty: bool) -> anyhow::Result<Summary> {
    let pool = pipeline::build_pool(settings.parallelism);
    let cancel = AtomicBool::new(false);
    let outcomes = pipeline::transduce_batch_until::<S>(contests, &pool, &cancel, settings.fail_fast);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut summary = Summary::default();
    for outcome in &outcomes {
        match outcome {
            BatchOutcome::Parsed { records, .. } => {
                summary.parsed += 1;
                summary.records += records.len();
                for record in records {
                    emit(&mut out, record, pretty)?;
                }
            }
            BatchOutcome::Unparsed(err) => {
                summary.unparsed += 1;
                summary.records += err.partial.len();
                for record in &err.partial {
                    emit(&mut out, record, pretty)?;
                }
                eprintln!("{err}");
            }
            BatchOutcome::Skipped { .. } => summary.skipped += 1,
        }
    }
    out.flush()?;
    Ok(summary)
}

fn main() -> anyhow::Result<()> {
    let mut settings = Settings::from_env();
    logging::init(settings.log.as_deref());

    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    let args = parse_args(&argv)?;
    if let Some(threads) = args.parallelism {
        settings.parallelism = threads.clamp(
            ncaa_pbp::config::MIN_PARALLELISM,
            ncaa_pbp::config::MAX_PARALLELISM,
        );
    }

    let contests = load_contests(&args)?;
    info!(contests = contests.len(), threads = settings.parallelism, "starting batch");

    let summary = match args.sport {
        SportArg::Football => run::<Football>(&contests, &settings, args.pretty)?,
        SportArg::Volleyball => run::<Volleyball>(&contests, &settings, args.pretty)?,
    };
    eprintln!(
        "{} contests: {} parsed, {} unparsed, {} skipped, {} records",
        contests.len(),
        summary.parsed,
        summary.unparsed,
        summary.skipped,
        summary.records
    );
    if summary.unparsed > 0 || summary.skipped > 0 {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{SportArg, arg_value, parse_args};

    fn argv(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn both_flag_forms_are_accepted() {
        let args = argv(&["--sport=volleyball", "--synthetic", "3", "--seed=9"]);
        assert_eq!(arg_value(&args, "--synthetic").as_deref(), Some("3"));
        let parsed = parse_args(&args).expect("valid args");
        assert_eq!(parsed.sport, SportArg::Volleyball);
        assert_eq!((parsed.synthetic, parsed.seed), (Some(3), 9));
    }

    #[test]
    fn input_or_synthetic_is_required() {
        assert!(parse_args(&argv(&["--sport", "football"])).is_err());
        assert!(parse_args(&argv(&["--sport", "curling", "--synthetic", "1"])).is_err());
        assert!(parse_args(&argv(&["--sport", "football", "--seed", "x", "--synthetic", "1"])).is_err());
    }
}
