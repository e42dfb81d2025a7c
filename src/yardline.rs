//! Absolute field position.
//!
//! Positions run from 0 at the possessing team's own goal line to 100 at the
//! opponent's goal line, so gains and air distance are plain subtraction.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::FieldError;

static SITUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?P<down>[1-4])(?:st|nd|rd|th)\s*(?:&|and)\s*(?P<dist>\d{1,2}|goal|inches)\s*(?:at|@)\s*(?P<spot>.+?)\s*$",
    )
    .expect("situation pattern compiles")
});

fn is_end_zone(lower: &str) -> bool {
    lower.contains("end zone") || lower.contains("endzone")
}

fn split_marker(token: &str) -> Option<(&str, &str)> {
    let token = token.trim();
    let digits_at = token
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    Some((token[..digits_at].trim(), &token[digits_at..]))
}

/// Maps a side-relative yard token onto the absolute scale.
///
/// A token on the possessor's side maps directly and the same value on the
/// other side is mirrored. For end-zone tokens `true` means the end zone the
/// offense is attacking, which is 100.
pub fn normalize(token: &str, is_posteam_side: bool) -> Result<u8, FieldError> {
    if is_end_zone(&token.to_lowercase()) {
        return Ok(if is_posteam_side { 100 } else { 0 });
    }
    let numeric = || FieldError::Numeric {
        field: "yard_line",
        raw: token.trim().to_string(),
    };
    let (_, digits) = split_marker(token).ok_or_else(numeric)?;
    let value = digits.parse::<u8>().map_err(|_| numeric())?;
    if value > 50 {
        return Err(numeric());
    }
    Ok(if is_posteam_side { value } else { 100 - value })
}

/// Team abbreviations used to decide which half a marker sits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFrame {
    pub offense: String,
    pub defense: String,
}

impl FieldFrame {
    pub fn new(offense: impl Into<String>, defense: impl Into<String>) -> Self {
        Self {
            offense: offense.into(),
            defense: defense.into(),
        }
    }

    /// Resolves a marker such as `UNC25`, `DUKE 40`, `50` or `UNC end zone`.
    ///
    /// `None` means the marker names no team this frame knows, so the half
    /// cannot be decided. Midfield needs no team.
    pub fn resolve(&self, token: &str) -> Result<Option<u8>, FieldError> {
        let token = token.trim();
        let token = token.strip_prefix("the ").unwrap_or(token);
        let lower = token.to_lowercase();

        if is_end_zone(&lower) {
            let owner = lower
                .split("end")
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
            // A team's own end zone is the one it defends.
            return match self.owner_is_offense(&owner) {
                Some(true) => normalize(token, false).map(Some),
                Some(false) => normalize(token, true).map(Some),
                None => Ok(None),
            };
        }

        let Some((prefix, _)) = split_marker(token) else {
            return Err(FieldError::Numeric {
                field: "yard_line",
                raw: token.to_string(),
            });
        };
        if prefix.is_empty() {
            let value = normalize(token, true)?;
            return Ok((value == 50).then_some(50));
        }
        match self.owner_is_offense(prefix) {
            Some(on_offense_side) => normalize(token, on_offense_side).map(Some),
            None => Ok(None),
        }
    }

    fn owner_is_offense(&self, label: &str) -> Option<bool> {
        if label.is_empty() {
            None
        } else if label.eq_ignore_ascii_case(&self.offense) {
            Some(true)
        } else if label.eq_ignore_ascii_case(&self.defense) {
            Some(false)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Situation {
    pub down: u8,
    /// `None` on goal-to-go, where the distance is the spot itself.
    pub distance: Option<u8>,
    pub spot: String,
}

/// Reads a down and distance line such as `1st & 10 at UNC25`.
pub fn parse_situation(raw: &str) -> Result<Situation, FieldError> {
    let caps = SITUATION
        .captures(raw)
        .ok_or_else(|| FieldError::Shape(format!("`{raw}` is not a down and distance")))?;
    let down = caps["down"].parse::<u8>().map_err(|_| FieldError::Numeric {
        field: "down",
        raw: caps["down"].to_string(),
    })?;
    let dist = &caps["dist"];
    let distance = match dist.to_lowercase().as_str() {
        "goal" => None,
        "inches" => Some(1),
        _ => Some(dist.parse::<u8>().map_err(|_| FieldError::Numeric {
            field: "distance",
            raw: dist.to_string(),
        })?),
    };
    Ok(Situation {
        down,
        distance,
        spot: caps["spot"].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{FieldFrame, normalize, parse_situation};

    #[test]
    fn mirror_sums_to_one_hundred() {
        for yard in 0..=50u8 {
            let token = format!("UNC{yard}");
            let own = normalize(&token, true).expect("valid token");
            let mirrored = normalize(&token, false).expect("valid token");
            assert_eq!(own as u16 + mirrored as u16, 100, "token {token}");
        }
    }

    #[test]
    fn end_zone_maps_to_goal_lines() {
        assert_eq!(normalize("end zone", true), Ok(100));
        assert_eq!(normalize("end zone", false), Ok(0));
    }

    #[test]
    fn rejects_markers_past_midfield() {
        assert!(normalize("UNC65", true).is_err());
        assert!(normalize("UNC", true).is_err());
    }

    #[test]
    fn frame_resolves_by_team() {
        let frame = FieldFrame::new("UNC", "DUKE");
        assert_eq!(frame.resolve("UNC25"), Ok(Some(25)));
        assert_eq!(frame.resolve("DUKE 40"), Ok(Some(60)));
        assert_eq!(frame.resolve("the 50"), Ok(Some(50)));
        assert_eq!(frame.resolve("35"), Ok(None));
        assert_eq!(frame.resolve("UNC end zone"), Ok(Some(0)));
        assert_eq!(frame.resolve("DUKE end zone"), Ok(Some(100)));
        assert_eq!(frame.resolve("WAKE30"), Ok(None));
    }

    #[test]
    fn situation_lines() {
        let sit = parse_situation("1st & 10 at UNC25").expect("situation");
        assert_eq!((sit.down, sit.distance, sit.spot.as_str()), (1, Some(10), "UNC25"));
        let sit = parse_situation("4th and Goal @ DUKE3").expect("situation");
        assert_eq!((sit.down, sit.distance), (4, None));
        assert!(parse_situation("kickoff").is_err());
    }
}
