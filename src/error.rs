use thiserror::Error;

/// Why a single play could not be turned into a record.
///
/// Every variant is fatal to the contest it occurs in. The offending text is
/// carried verbatim so the rule table can be extended.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no rule matched play text `{text}`")]
    ClassificationGap { text: String },
    #[error("rule `{rule}` matched but {detail}: `{text}`")]
    ExtractionMismatch {
        rule: &'static str,
        text: String,
        detail: String,
    },
    #[error("rule `{rule}` captured `{raw}` for {field}, which is not a valid value")]
    NumericParseFailure {
        rule: &'static str,
        field: &'static str,
        raw: String,
    },
}

/// Failure reported by an extractor before it knows which rule it ran under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Missing(&'static str),
    Numeric { field: &'static str, raw: String },
    Shape(String),
}

impl FieldError {
    pub(crate) fn into_parse(self, rule: &'static str, text: &str) -> ParseError {
        match self {
            FieldError::Missing(field) => ParseError::ExtractionMismatch {
                rule,
                text: text.to_string(),
                detail: format!("capture `{field}` is absent"),
            },
            FieldError::Shape(detail) => ParseError::ExtractionMismatch {
                rule,
                text: text.to_string(),
                detail,
            },
            FieldError::Numeric { field, raw } => {
                ParseError::NumericParseFailure { rule, field, raw }
            }
        }
    }
}

/// A contest that stopped part way through.
///
/// `partial` keeps the records for every play before the failing one. No
/// record exists for the play at `sequence`.
#[derive(Debug, Error)]
#[error("contest {contest_id} unparsed at play {sequence}: {error}")]
pub struct ContestError<R: std::fmt::Debug> {
    pub contest_id: u64,
    pub sequence: u32,
    #[source]
    pub error: ParseError,
    pub partial: Vec<R>,
}

#[cfg(test)]
mod tests {
    use super::{FieldError, ParseError};

    #[test]
    fn numeric_failure_keeps_raw_capture() {
        let err = FieldError::Numeric {
            field: "yards",
            raw: "twelve".to_string(),
        }
        .into_parse("rush_plain", "A rush for twelve yards");
        assert_eq!(
            err,
            ParseError::NumericParseFailure {
                rule: "rush_plain",
                field: "yards",
                raw: "twelve".to_string(),
            }
        );
    }

    #[test]
    fn missing_capture_is_a_mismatch() {
        let err = FieldError::Missing("passer").into_parse("pass_plain", "pass complete");
        assert!(matches!(err, ParseError::ExtractionMismatch { rule: "pass_plain", .. }));
        assert!(err.to_string().contains("passer"));
    }
}
