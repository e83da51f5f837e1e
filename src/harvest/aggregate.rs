use crate::otp::{Record, engine::DEFAULT_PERIOD};
use serde::Serialize;

/// Records of one harvest, sorted by case-insensitive name.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ResultSet(Vec<Record>);

impl ResultSet {
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.0.iter()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<Record> {
        self.0
    }

    /// Width of the longest display name, in characters.
    #[must_use]
    pub fn longest_name(&self) -> usize {
        self.0
            .iter()
            .map(|record| record.name.chars().count())
            .max()
            .unwrap_or(0)
    }

    /// Shortest refresh period across all records.
    #[must_use]
    pub fn min_period(&self) -> u64 {
        self.0
            .iter()
            .map(|record| record.period)
            .filter(|period| *period > 0)
            .min()
            .unwrap_or(DEFAULT_PERIOD)
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Sort delivered records. Names equal ignoring case fall back to the exact
/// name and then the key, so the order never depends on arrival order.
#[must_use]
pub fn finalize(mut records: Vec<Record>) -> ResultSet {
    records.sort_by_cached_key(|record| {
        (
            record.name.to_lowercase(),
            record.name.clone(),
            record.key.clone(),
        )
    });
    ResultSet(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, name: &str, period: u64) -> Record {
        Record {
            key: key.to_string(),
            name: name.to_string(),
            icon: "key".to_string(),
            secret: None,
            digits: 6,
            period,
            code: "123456".to_string(),
        }
    }

    fn names(set: &ResultSet) -> Vec<&str> {
        set.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn sorts_case_insensitively() {
        let set = finalize(vec![
            record("k/c", "charlie", 30),
            record("k/a", "Alpha", 30),
            record("k/b", "bravo", 30),
        ]);
        assert_eq!(names(&set), vec!["Alpha", "bravo", "charlie"]);
    }

    #[test]
    fn case_only_differences_have_a_fixed_order() {
        let forward = finalize(vec![
            record("k/1", "github", 30),
            record("k/2", "GitHub", 30),
            record("k/3", "GITHUB", 30),
        ]);
        let backward = finalize(vec![
            record("k/3", "GITHUB", 30),
            record("k/2", "GitHub", 30),
            record("k/1", "github", 30),
        ]);
        assert_eq!(names(&forward), names(&backward));
        assert_eq!(names(&forward), vec!["GITHUB", "GitHub", "github"]);
    }

    #[test]
    fn identical_names_order_by_key() {
        let set = finalize(vec![record("k/b", "same", 30), record("k/a", "same", 30)]);
        let keys: Vec<&str> = set.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["k/a", "k/b"]);
    }

    #[test]
    fn longest_name_counts_characters() {
        let set = finalize(vec![record("k/a", "äbc", 30), record("k/b", "ab", 30)]);
        assert_eq!(set.longest_name(), 3);
        assert_eq!(ResultSet::default().longest_name(), 0);
    }

    #[test]
    fn min_period_defaults_to_thirty() {
        assert_eq!(ResultSet::default().min_period(), 30);
        let set = finalize(vec![record("k/a", "a", 60), record("k/b", "b", 15)]);
        assert_eq!(set.min_period(), 15);
    }
}
