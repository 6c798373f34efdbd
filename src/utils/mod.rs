pub mod time;

use std::sync::LazyLock;

use regex::Regex;

static TRAILING_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)$").unwrap());

/// Random url-safe id used for session and saved-workflow keys.
pub fn longid() -> String {
    nanoid::nanoid!(21)
}

/// Numeric suffix of an id such as `node_12` or `conn3`.
pub fn numeric_suffix(id: &str) -> Option<u64> {
    TRAILING_DIGITS.captures(id).and_then(|caps| caps[1].parse::<u64>().ok())
}

/// Next counter value after every numeric suffix in `ids`, starting at 1.
pub fn next_counter<'a, I>(ids: I) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    ids.into_iter().filter_map(numeric_suffix).max().map_or(1, |max| max.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_suffix() {
        assert_eq!(numeric_suffix("node_12"), Some(12));
        assert_eq!(numeric_suffix("node1"), Some(1));
        assert_eq!(numeric_suffix("start"), None);
        assert_eq!(numeric_suffix(""), None);
    }

    #[test]
    fn test_next_counter() {
        assert_eq!(next_counter(["node_1", "node_7", "node_3"]), 8);
        assert_eq!(next_counter(["trigger", "node_2"]), 3);
        assert_eq!(next_counter(Vec::<&str>::new()), 1);
    }

    #[test]
    fn test_longid_is_unique() {
        assert_ne!(longid(), longid());
        assert_eq!(longid().len(), 21);
    }
}
