use std::env;

pub const MIN_PARALLELISM: usize = 1;
pub const MAX_PARALLELISM: usize = 64;

/// Runtime knobs read from the environment after `.env.local` and `.env`
/// are loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Worker threads for the contest pool.
    pub parallelism: usize,
    /// Tracing filter directives, e.g. `ncaa_pbp=debug`.
    pub log: Option<String>,
    /// Stop scheduling contests after the first unparsed one.
    pub fail_fast: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            log: None,
            fail_fast: false,
        }
    }
}

impl Settings {
    pub fn load_dotenv() {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
    }

    pub fn from_env() -> Self {
        Self::load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from any key lookup; unparseable values fall back to
    /// the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let opt = |key: &str| lookup(key).filter(|val| !val.trim().is_empty());
        let parallelism = opt("PBP_PARALLELISM")
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or_else(default_parallelism)
            .clamp(MIN_PARALLELISM, MAX_PARALLELISM);
        let fail_fast = opt("PBP_FAIL_FAST")
            .map(|val| parse_flag(&val))
            .unwrap_or(false);
        Self {
            parallelism,
            log: opt("PBP_LOG"),
            fail_fast,
        }
    }
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .clamp(MIN_PARALLELISM, MAX_PARALLELISM)
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{MAX_PARALLELISM, Settings};

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn parallelism_is_clamped() {
        assert_eq!(settings(&[("PBP_PARALLELISM", "0")]).parallelism, 1);
        assert_eq!(settings(&[("PBP_PARALLELISM", "500")]).parallelism, MAX_PARALLELISM);
        assert_eq!(settings(&[("PBP_PARALLELISM", "3")]).parallelism, 3);
        assert!(settings(&[("PBP_PARALLELISM", "many")]).parallelism >= 1);
    }

    #[test]
    fn flags_and_blank_values() {
        let s = settings(&[("PBP_FAIL_FAST", "yes"), ("PBP_LOG", "  ")]);
        assert!(s.fail_fast);
        assert_eq!(s.log, None);
        assert!(!settings(&[("PBP_FAIL_FAST", "0")]).fail_fast);
    }
}
