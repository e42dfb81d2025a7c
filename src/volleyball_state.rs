use serde::Serialize;

use crate::error::ParseError;
use crate::pipeline::{Sport, Step};
use crate::play::{ContestMeta, RawPlay, ScorePair, Side};
use crate::volleyball_rules::{self, VolleyballKind};
use crate::volleyball_extract::VolleyballFields;

/// The fifth set of a best-of-five match is played to 15.
pub const DECIDING_SET: u8 = 5;
pub const DEUCE_AT: u16 = 24;
pub const DECIDING_DEUCE_AT: u16 = 14;
const MAX_SETS: usize = DECIDING_SET as usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchState {
    pub current_set: u8,
    pub home_set_score: u16,
    pub away_set_score: u16,
    pub home_cumulative_score: u16,
    pub away_cumulative_score: u16,
    pub home_sets_won: u8,
    pub away_sets_won: u8,
    pub is_extra_points: bool,
    /// Final score of each finished set, by set number.
    pub completed: [Option<ScorePair>; MAX_SETS],
}

impl MatchState {
    pub fn initial(first: Option<&RawPlay>) -> Self {
        Self {
            current_set: first.map(|p| p.period.max(1)).unwrap_or(1),
            home_set_score: 0,
            away_set_score: 0,
            home_cumulative_score: 0,
            away_cumulative_score: 0,
            home_sets_won: 0,
            away_sets_won: 0,
            is_extra_points: false,
            completed: [None; MAX_SETS],
        }
    }

    pub fn set_score(&self) -> ScorePair {
        ScorePair::new(self.home_set_score, self.away_set_score)
    }

    pub fn sets_won(&self, side: Side) -> u8 {
        match side {
            Side::Home => self.home_sets_won,
            Side::Away => self.away_sets_won,
        }
    }

    pub fn deuce_threshold(&self) -> u16 {
        if self.current_set >= DECIDING_SET {
            DECIDING_DEUCE_AT
        } else {
            DEUCE_AT
        }
    }

    /// Records a running set score and re-evaluates the deuce flag, which
    /// stays raised until the set ends.
    pub fn observe(&mut self, score: ScorePair) {
        self.home_set_score = score.home;
        self.away_set_score = score.away;
        let threshold = self.deuce_threshold();
        self.is_extra_points |= score.home >= threshold && score.away >= threshold;
    }

    fn open_set(&mut self, set: u8) {
        self.current_set = set;
        self.home_set_score = 0;
        self.away_set_score = 0;
        self.is_extra_points = false;
    }

    /// Credits the finished set and moves on to the next one.
    pub fn close_set(&mut self) {
        let score = self.set_score();
        if score.home > score.away {
            self.home_sets_won += 1;
        } else if score.away > score.home {
            self.away_sets_won += 1;
        }
        self.home_cumulative_score += score.home;
        self.away_cumulative_score += score.away;
        if let Some(slot) = self
            .completed
            .get_mut(usize::from(self.current_set.saturating_sub(1)))
        {
            *slot = Some(score);
        }
        self.open_set(self.current_set.saturating_add(1));
    }

    /// Pre-play snapshot. A caller period ahead of the tracked set opens that
    /// set; sets never move backwards.
    pub fn snap(&self, play: &RawPlay) -> MatchState {
        let mut pre = self.clone();
        if play.period > pre.current_set {
            pre.open_set(play.period);
        }
        pre
    }
}

pub fn advance(pre: &MatchState, kind: VolleyballKind, score: Option<ScorePair>) -> MatchState {
    let mut post = pre.clone();
    if let Some(score) = score {
        post.observe(score);
    }
    if kind == VolleyballKind::EndOfSet {
        post.close_set();
    }
    post
}

/// The set-based sport.
#[derive(Debug, Clone, Copy, Default)]
pub struct Volleyball;

impl Sport for Volleyball {
    type Kind = VolleyballKind;
    type Fields = VolleyballFields;
    type State = MatchState;

    const NAME: &'static str = "volleyball";

    fn initial_state(_meta: &ContestMeta, first: Option<&RawPlay>) -> MatchState {
        MatchState::initial(first)
    }

    fn step(state: &MatchState, _meta: &ContestMeta, play: &RawPlay) -> Result<Step<Self>, ParseError> {
        let pre = state.snap(play);
        let parsed = volleyball_rules::parse_line(&play.text)?;
        let post = advance(&pre, parsed.matched.kind, play.score);
        Ok(Step {
            matched: parsed.matched,
            fields: parsed.fields,
            pre,
            post,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{MatchState, advance};
    use crate::play::ScorePair;
    use crate::volleyball_rules::VolleyballKind;

    #[test]
    fn deuce_flag_holds_until_the_set_ends() {
        let mut state = MatchState::initial(None);
        state = advance(&state, VolleyballKind::Kill, Some(ScorePair::new(24, 23)));
        assert!(!state.is_extra_points);
        state = advance(&state, VolleyballKind::Kill, Some(ScorePair::new(24, 24)));
        assert!(state.is_extra_points);
        state = advance(&state, VolleyballKind::Kill, Some(ScorePair::new(25, 24)));
        assert!(state.is_extra_points);
        state = advance(&state, VolleyballKind::Kill, Some(ScorePair::new(26, 24)));
        state = advance(&state, VolleyballKind::EndOfSet, None);
        assert!(!state.is_extra_points);
        assert_eq!((state.current_set, state.home_sets_won, state.away_sets_won), (2, 1, 0));
        assert_eq!((state.home_cumulative_score, state.away_cumulative_score), (26, 24));
        assert_eq!(state.completed[0], Some(ScorePair::new(26, 24)));
    }

    #[test]
    fn deciding_set_uses_the_lower_threshold() {
        let mut state = MatchState::initial(None);
        state.current_set = 5;
        state = advance(&state, VolleyballKind::Attack, Some(ScorePair::new(14, 13)));
        assert!(!state.is_extra_points);
        state = advance(&state, VolleyballKind::Kill, Some(ScorePair::new(14, 14)));
        assert!(state.is_extra_points);
    }
}
