//! Per-contest fold and the contest-level fan-out.
//!
//! Inside a contest plays are folded strictly in order. Contests share
//! nothing, so a batch is spread across a rayon pool one contest per task.

use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ContestError, ParseError};
use crate::play::{Contest, ContestMeta, PlayRecord, RawPlay};
use crate::rules::Matched;

/// One sport's transducer: a rule table plus a state tracker.
pub trait Sport: Send + Sync + 'static {
    type Kind: Copy + Debug + Serialize + Send + Sync + 'static;
    type Fields: Clone + Debug + Serialize + Send;
    type State: Clone + Debug + Serialize + Send;

    const NAME: &'static str;

    fn initial_state(meta: &ContestMeta, first: Option<&RawPlay>) -> Self::State;

    /// Classify, extract and advance the state for one play.
    fn step(
        state: &Self::State,
        meta: &ContestMeta,
        play: &RawPlay,
    ) -> Result<Step<Self>, ParseError>;
}

pub struct Step<S: Sport + ?Sized> {
    pub matched: Matched<S::Kind>,
    pub fields: S::Fields,
    pub pre: S::State,
    pub post: S::State,
}

pub type Record<S> = PlayRecord<<S as Sport>::Kind, <S as Sport>::Fields, <S as Sport>::State>;

pub type ContestResult<S> = Result<Vec<Record<S>>, ContestError<Record<S>>>;

/// Folds one contest's plays into records.
///
/// Stops at the first play that fails; the error keeps every record built
/// before it.
pub fn transduce<S: Sport>(contest: &Contest) -> ContestResult<S> {
    let meta = &contest.meta;
    debug!(
        sport = S::NAME,
        contest = meta.contest_id,
        plays = contest.plays.len(),
        "transducing contest"
    );
    let initial = S::initial_state(meta, contest.plays.first());
    let records = Vec::with_capacity(contest.plays.len());

    let (_, records) = contest.plays.iter().try_fold(
        (initial, records),
        |(state, mut records), play| match S::step(&state, meta, play) {
            Ok(step) => {
                let next = step.post.clone();
                records.push(PlayRecord {
                    sequence: play.sequence,
                    kind: step.matched.kind,
                    rule: step.matched.name,
                    fields: step.fields,
                    pre: step.pre,
                    post: step.post,
                    meta: Arc::clone(meta),
                });
                Ok((next, records))
            }
            Err(error) => {
                warn!(
                    sport = S::NAME,
                    contest = meta.contest_id,
                    sequence = play.sequence,
                    %error,
                    "contest left unparsed"
                );
                Err(ContestError {
                    contest_id: meta.contest_id,
                    sequence: play.sequence,
                    error,
                    partial: records,
                })
            }
        },
    )?;
    debug!(sport = S::NAME, contest = meta.contest_id, records = records.len(), "contest done");
    Ok(records)
}

pub fn build_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|idx| format!("pbp-{idx}"))
        .build()
        .ok()
}

pub fn with_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}

/// Transduces every contest, in parallel, returning results in input order.
pub fn transduce_batch<S: Sport>(
    contests: &[Contest],
    pool: &Option<rayon::ThreadPool>,
) -> Vec<ContestResult<S>> {
    with_pool(pool, || contests.par_iter().map(transduce::<S>).collect())
}

#[derive(Debug)]
pub enum BatchOutcome<S: Sport> {
    Parsed {
        contest_id: u64,
        records: Vec<Record<S>>,
    },
    Unparsed(ContestError<Record<S>>),
    /// Cancelled before this contest was started.
    Skipped { contest_id: u64 },
}

impl<S: Sport> BatchOutcome<S> {
    pub fn contest_id(&self) -> u64 {
        match self {
            BatchOutcome::Parsed { contest_id, .. } => *contest_id,
            BatchOutcome::Unparsed(err) => err.contest_id,
            BatchOutcome::Skipped { contest_id } => *contest_id,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, BatchOutcome::Parsed { .. })
    }
}

/// Like [`transduce_batch`], but checks `cancel` before starting each
/// contest. Contests already running finish normally. With `stop_on_error`
/// the first unparsed contest raises `cancel` itself.
pub fn transduce_batch_until<S: Sport>(
    contests: &[Contest],
    pool: &Option<rayon::ThreadPool>,
    cancel: &AtomicBool,
    stop_on_error: bool,
) -> Vec<BatchOutcome<S>> {
    with_pool(pool, || {
        contests
            .par_iter()
            .map(|contest| {
                if cancel.load(Ordering::Relaxed) {
                    return BatchOutcome::Skipped {
                        contest_id: contest.meta.contest_id,
                    };
                }
                match transduce::<S>(contest) {
                    Ok(records) => BatchOutcome::Parsed {
                        contest_id: contest.meta.contest_id,
                        records,
                    },
                    Err(err) => {
                        if stop_on_error {
                            cancel.store(true, Ordering::Relaxed);
                        }
                        BatchOutcome::Unparsed(err)
                    }
                }
            })
            .collect()
    })
}
