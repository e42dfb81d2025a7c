//! Ordered, first-match-wins rule tables shared by both sports.
//!
//! A table is plain data: each [`Rule`] pairs a phrase guard with the capture
//! pattern and extractor that run once the guard has selected it. The order
//! of the slice is the precedence order, so a rule whose guard is a subset of
//! another rule's guard must come after it.

use std::str::FromStr;

use regex::{Captures, Regex};

use crate::error::{FieldError, ParseError};

pub type Extractor<F, C> = fn(&Captures<'_>, &C) -> Result<F, FieldError>;

/// Phrase test run against the lowercased play text.
///
/// Phrases match on word boundaries, so `rush` never fires inside `Brush`.
/// A trailing `*` lets a phrase match as a word stem (`fumble*` covers
/// `fumbled`).
#[derive(Debug, Clone, Copy)]
pub struct Guard {
    pub all: &'static [&'static str],
    pub any: &'static [&'static str],
    pub none: &'static [&'static str],
    /// Whole-line regex for bare lines that phrases cannot pin down.
    pub shape: Option<&'static str>,
}

impl Guard {
    pub const fn all(phrases: &'static [&'static str]) -> Self {
        Guard {
            all: phrases,
            any: &[],
            none: &[],
            shape: None,
        }
    }

    pub const fn any_of(phrases: &'static [&'static str]) -> Self {
        Guard {
            all: &[],
            any: phrases,
            none: &[],
            shape: None,
        }
    }

    pub const fn shape(pattern: &'static str) -> Self {
        Guard {
            all: &[],
            any: &[],
            none: &[],
            shape: Some(pattern),
        }
    }

    pub const fn or(self, phrases: &'static [&'static str]) -> Self {
        Guard {
            any: phrases,
            ..self
        }
    }

    pub const fn but_not(self, phrases: &'static [&'static str]) -> Self {
        Guard {
            none: phrases,
            ..self
        }
    }

    fn compile(&self) -> Result<CompiledGuard, regex::Error> {
        let phrases = |list: &[&str]| list.iter().map(|p| phrase(p)).collect::<Result<Vec<_>, _>>();
        Ok(CompiledGuard {
            all: phrases(self.all)?,
            any: phrases(self.any)?,
            none: phrases(self.none)?,
            shape: self.shape.map(Regex::new).transpose()?,
        })
    }
}

/// Word-bounded matcher for one guard phrase. Edges that are not word
/// characters (`starters:`, `) by`) are matched as written.
fn phrase(raw: &str) -> Result<Regex, regex::Error> {
    let (body, stem) = match raw.strip_suffix('*') {
        Some(body) => (body, true),
        None => (raw, false),
    };
    let body = body.trim();
    let word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let mut pattern = String::new();
    if word(body.chars().next()) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(body));
    if stem {
        pattern.push_str(r"\w*");
    } else if word(body.chars().last()) {
        pattern.push_str(r"\b");
    }
    // Phrases written with a trailing space still need a following word.
    if raw.ends_with(' ') {
        pattern.push_str(r"\s");
    }
    Regex::new(&pattern)
}

struct CompiledGuard {
    all: Vec<Regex>,
    any: Vec<Regex>,
    none: Vec<Regex>,
    shape: Option<Regex>,
}

impl CompiledGuard {
    fn holds(&self, lower: &str) -> bool {
        self.all.iter().all(|re| re.is_match(lower))
            && (self.any.is_empty() || self.any.iter().any(|re| re.is_match(lower)))
            && !self.none.iter().any(|re| re.is_match(lower))
            && self.shape.as_ref().is_none_or(|re| re.is_match(lower))
    }
}

pub struct Rule<K: 'static, F: 'static, C: 'static> {
    pub name: &'static str,
    pub kind: K,
    pub guard: Guard,
    /// Capture pattern. `{NAME}` style placeholders are expanded from the
    /// table's fragment list before compiling.
    pub pattern: &'static str,
    pub extract: Extractor<F, C>,
}

/// Which rule fired for a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matched<K> {
    pub index: usize,
    pub name: &'static str,
    pub kind: K,
}

struct Compiled<K: 'static, F: 'static, C: 'static> {
    rule: &'static Rule<K, F, C>,
    guard: CompiledGuard,
    pattern: Regex,
}

pub struct RuleTable<K: 'static, F: 'static, C: 'static> {
    rules: Vec<Compiled<K, F, C>>,
}

impl<K: Copy, F, C> RuleTable<K, F, C> {
    pub fn compile(
        rules: &'static [Rule<K, F, C>],
        fragments: &[(&str, &str)],
    ) -> Result<Self, regex::Error> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let guard = rule.guard.compile()?;
            let pattern = Regex::new(&expand(rule.pattern, fragments))?;
            compiled.push(Compiled {
                rule,
                guard,
                pattern,
            });
        }
        Ok(Self { rules: compiled })
    }

    /// First rule whose guard holds, or `None` when the table has a gap.
    pub fn classify(&self, text: &str) -> Option<Matched<K>> {
        let lower = text.to_lowercase();
        self.rules
            .iter()
            .enumerate()
            .find(|(_, c)| c.guard.holds(&lower))
            .map(|(index, c)| Matched {
                index,
                name: c.rule.name,
                kind: c.rule.kind,
            })
    }

    pub fn extract(&self, matched: &Matched<K>, text: &str, ctx: &C) -> Result<F, ParseError> {
        let compiled = self.rules.get(matched.index).ok_or_else(|| {
            ParseError::ExtractionMismatch {
                rule: matched.name,
                text: text.to_string(),
                detail: format!("rule index {} is outside the table", matched.index),
            }
        })?;
        let caps = compiled
            .pattern
            .captures(text)
            .ok_or_else(|| ParseError::ExtractionMismatch {
                rule: compiled.rule.name,
                text: text.to_string(),
                detail: "capture pattern did not match".to_string(),
            })?;
        (compiled.rule.extract)(&caps, ctx).map_err(|err| err.into_parse(compiled.rule.name, text))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|c| c.rule.name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names().position(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn expand(pattern: &str, fragments: &[(&str, &str)]) -> String {
    fragments
        .iter()
        .fold(pattern.to_string(), |acc, (key, value)| acc.replace(key, value))
}

pub(crate) fn text<'t>(caps: &Captures<'t>, name: &'static str) -> Result<&'t str, FieldError> {
    opt_text(caps, name).ok_or(FieldError::Missing(name))
}

pub(crate) fn opt_text<'t>(caps: &Captures<'t>, name: &str) -> Option<&'t str> {
    caps.name(name)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

pub(crate) fn opt_owned(caps: &Captures<'_>, name: &str) -> Option<String> {
    opt_text(caps, name).map(str::to_string)
}

pub(crate) fn number<T: FromStr>(caps: &Captures<'_>, name: &'static str) -> Result<T, FieldError> {
    opt_number(caps, name)?.ok_or(FieldError::Missing(name))
}

pub(crate) fn opt_number<T: FromStr>(
    caps: &Captures<'_>,
    name: &'static str,
) -> Result<Option<T>, FieldError> {
    match opt_text(caps, name) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| FieldError::Numeric {
            field: name,
            raw: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use regex::Captures;

    use super::{Guard, Rule, RuleTable, number, text};
    use crate::error::{FieldError, ParseError};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        Special,
        Plain,
    }

    fn grab(caps: &Captures<'_>, _: &()) -> Result<u8, FieldError> {
        let _ = text(caps, "who")?;
        number(caps, "n")
    }

    static RULES: &[Rule<Kind, u8, ()>] = &[
        Rule {
            name: "special",
            kind: Kind::Special,
            guard: Guard::all(&["gain", "bonus"]).but_not(&["void"]),
            pattern: r"{WHO} gain (?P<n>\d+)",
            extract: grab,
        },
        Rule {
            name: "plain",
            kind: Kind::Plain,
            guard: Guard::all(&["gain"]),
            pattern: r"{WHO} gain (?P<n>\d+)",
            extract: grab,
        },
    ];

    fn table() -> RuleTable<Kind, u8, ()> {
        RuleTable::compile(RULES, &[("{WHO}", r"(?P<who>[A-Z]\w*)")]).expect("patterns compile")
    }

    #[test]
    fn first_matching_rule_wins() {
        let table = table();
        let hit = table.classify("Ann gain 4 BONUS").expect("classified");
        assert_eq!((hit.index, hit.kind), (0, Kind::Special));
        let hit = table.classify("Ann gain 4 bonus void").expect("classified");
        assert_eq!(hit.name, "plain");
        assert!(table.classify("Ann loss 4").is_none());
        assert_eq!(table.position("plain"), Some(1));
    }

    #[test]
    fn phrases_match_whole_words() {
        let guard = Guard::all(&["rush"]).or(&["good", "fumble*"]).compile().expect("phrases compile");
        assert!(guard.holds("t. brown rush attempt good"));
        assert!(guard.holds("t. brown rush for 2 yards, fumbled by t. brown"));
        assert!(!guard.holds("t. goodwin rush attempt"));
        assert!(!guard.holds("j. brush punt good"));

        let guard = Guard::all(&[") by", "timeout "]).compile().expect("phrases compile");
        assert!(guard.holds("set(jump) by doe timeout unc"));
        assert!(!guard.holds("set(jump) by doe timeout"));
    }

    #[test]
    fn extraction_errors_name_the_rule() {
        let table = table();
        let hit = table.classify("Ann gain 400").expect("classified");
        let err = table.extract(&hit, "Ann gain 400", &()).unwrap_err();
        assert_eq!(
            err,
            ParseError::NumericParseFailure {
                rule: "plain",
                field: "n",
                raw: "400".to_string(),
            }
        );
        let hit = table.classify("ann gain 4").expect("classified");
        let err = table.extract(&hit, "ann gain 4", &()).unwrap_err();
        assert!(matches!(err, ParseError::ExtractionMismatch { rule: "plain", .. }));
    }
}
