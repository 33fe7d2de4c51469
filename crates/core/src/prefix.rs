//! Number-prefix reference tables and longest-prefix matching.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which reference table a lookup or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Country,
    City,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Country => write!(f, "country"),
            TableKind::City => write!(f, "city"),
        }
    }
}

/// A label together with the prefix that selected it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefixMatch<'a> {
    pub label: &'a str,
    pub prefix: &'a str,
}

/// Immutable mapping from label (country or city name) to its prefixes.
///
/// Labels keep their source order. Lookup goes through an inverted
/// prefix → label index; when the same prefix is listed under two labels,
/// the label listed later owns it.
#[derive(Debug, Clone, Default)]
pub struct PrefixTable {
    labels: IndexMap<String, Vec<String>>,
    index: HashMap<String, usize>,
    longest: usize,
}

impl PrefixTable {
    /// Build a table from `(label, prefixes)` entries in source order.
    pub fn new<I, L, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (L, P)>,
        L: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let mut labels: IndexMap<String, Vec<String>> = IndexMap::new();
        for (label, prefixes) in entries {
            labels
                .entry(label.into())
                .or_default()
                .extend(prefixes.into_iter().map(Into::into));
        }

        let mut index = HashMap::new();
        let mut longest = 0;
        for (idx, prefixes) in labels.values().enumerate() {
            for prefix in prefixes.iter().filter(|p| !p.is_empty()) {
                longest = longest.max(prefix.len());
                index.insert(prefix.clone(), idx);
            }
        }

        Self {
            labels,
            index,
            longest,
        }
    }

    /// Find the label whose prefix is the longest prefix of `number`.
    pub fn longest_match(&self, number: &str) -> Option<PrefixMatch<'_>> {
        // Walk candidate prefixes from longest to shortest on char boundaries.
        let mut cuts: Vec<usize> = number
            .char_indices()
            .map(|(i, c)| i + c.len_utf8())
            .take_while(|&end| end <= self.longest)
            .collect();
        cuts.reverse();

        cuts.into_iter().find_map(|end| {
            let candidate = &number[..end];
            let (prefix, &idx) = self.index.get_key_value(candidate)?;
            let (label, _) = self.labels.get_index(idx)?;
            Some(PrefixMatch {
                label: label.as_str(),
                prefix: prefix.as_str(),
            })
        })
    }

    /// Label lookup without the matched prefix.
    pub fn label_for(&self, number: &str) -> Option<&str> {
        self.longest_match(number).map(|m| m.label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }

    pub fn prefixes(&self, label: &str) -> Option<&[String]> {
        self.labels.get(label).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of distinct prefixes in the lookup index.
    pub fn prefix_count(&self) -> usize {
        self.index.len()
    }
}

/// The country and city tables, built once and shared read-only.
///
/// A table is `None` when its source could not be loaded; the geographic
/// sub-computation that needs it reports that instead of guessing.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub country: Option<PrefixTable>,
    pub city: Option<PrefixTable>,
}

impl ReferenceTables {
    pub fn new(country: PrefixTable, city: PrefixTable) -> Self {
        Self {
            country: Some(country),
            city: Some(city),
        }
    }

    pub fn table(&self, kind: TableKind) -> Option<&PrefixTable> {
        match kind {
            TableKind::Country => self.country.as_ref(),
            TableKind::City => self.city.as_ref(),
        }
    }

    /// Kinds of tables that are not loaded.
    pub fn missing(&self) -> Vec<TableKind> {
        [TableKind::Country, TableKind::City]
            .into_iter()
            .filter(|kind| self.table(*kind).is_none())
            .collect()
    }

    /// Country and matching prefix for a single raw number.
    pub fn identify_country(&self, number: &str) -> Option<PrefixMatch<'_>> {
        self.country.as_ref()?.longest_match(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &[&str])]) -> PrefixTable {
        PrefixTable::new(
            entries
                .iter()
                .map(|(label, prefixes)| (*label, prefixes.iter().copied())),
        )
    }

    #[test]
    fn longest_prefix_wins() {
        let t = table(&[("A", &["7"]), ("B", &["77"])]);
        assert_eq!(t.label_for("77012345678"), Some("B"));
        assert_eq!(t.label_for("79012345678"), Some("A"));
    }

    #[test]
    fn longest_prefix_wins_regardless_of_order() {
        let t = table(&[("B", &["77"]), ("A", &["7"])]);
        let m = t.longest_match("77012345678").unwrap();
        assert_eq!(m.label, "B");
        assert_eq!(m.prefix, "77");
    }

    #[test]
    fn no_match_returns_none() {
        let t = table(&[("A", &["7"])]);
        assert_eq!(t.label_for("4912345"), None);
        assert_eq!(t.label_for(""), None);
    }

    #[test]
    fn later_label_owns_duplicate_prefix() {
        let t = table(&[("Old", &["727"]), ("New", &["727"])]);
        assert_eq!(t.label_for("7271234567"), Some("New"));
    }

    #[test]
    fn prefix_longer_than_number_does_not_match() {
        let t = table(&[("City", &["71234"])]);
        assert_eq!(t.label_for("712"), None);
    }

    #[test]
    fn handles_non_ascii_numbers() {
        let t = table(&[("Plus", &["+7"])]);
        assert_eq!(t.label_for("+7№123"), Some("Plus"));
        assert_eq!(t.label_for("№123"), None);
    }

    #[test]
    fn empty_prefixes_are_ignored() {
        let t = table(&[("Everything", &[""])]);
        assert_eq!(t.label_for("123"), None);
        assert_eq!(t.prefix_count(), 0);
    }

    #[test]
    fn missing_tables_are_reported() {
        let tables = ReferenceTables {
            country: Some(table(&[("A", &["7"])])),
            city: None,
        };
        assert_eq!(tables.missing(), vec![TableKind::City]);
        assert_eq!(tables.identify_country("7700").unwrap().label, "A");
    }
}
