//! Static name-to-code tables for the JVLink schema.
//!
//! Venue and grade columns store fixed-width text codes; callers supply
//! human-readable names. The tables are built once at first use and never
//! mutated, so they can be shared freely across threads.

use std::collections::HashMap;
use std::sync::LazyLock;

use strsim::levenshtein;

use crate::error::{QueryError, QueryResult};

/// An immutable name-to-code mapping with fuzzy suggestions on miss.
#[derive(Debug)]
pub struct CodeTable {
    label: &'static str,
    entries: Vec<(&'static str, &'static str)>,
    index: HashMap<&'static str, &'static str>,
}

impl CodeTable {
    fn new(label: &'static str, entries: &[(&'static str, &'static str)]) -> Self {
        Self {
            label,
            entries: entries.to_vec(),
            index: entries.iter().copied().collect(),
        }
    }

    /// Human-readable label used in error messages (e.g. "venue").
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Look up the code for a name. Exact match first, then case-folded
    /// (grade names accept `g1` for `G1`).
    pub fn code(&self, name: &str) -> Option<&'static str> {
        if let Some(code) = self.index.get(name).copied() {
            return Some(code);
        }
        self.index.get(name.to_uppercase().as_str()).copied()
    }

    /// All known names, in definition order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| (*n).to_string()).collect()
    }

    /// Resolve a name to its code, or fail listing the valid key set.
    pub fn resolve(&self, name: &str) -> QueryResult<&'static str> {
        self.code(name).ok_or_else(|| QueryError::UnknownName {
            table: self.label,
            name: name.to_string(),
            valid: self.names(),
            suggestion: self.suggest(name),
        })
    }

    /// Find the closest known name within a Levenshtein threshold.
    fn suggest(&self, input: &str) -> Option<String> {
        let mut best_match = None;
        let mut min_dist = usize::MAX;

        for (cand, _) in &self.entries {
            let dist = levenshtein(input, cand);

            // Dynamic threshold based on length
            let threshold = match input.chars().count() {
                0..=2 => 1,
                3..=5 => 2,
                _ => 3,
            };

            if dist <= threshold && dist < min_dist {
                min_dist = dist;
                best_match = Some((*cand).to_string());
            }
        }

        best_match
    }
}

/// JRA central racecourse names to `JyoCD` codes.
pub static JRA_VENUES: LazyLock<CodeTable> = LazyLock::new(|| {
    CodeTable::new(
        "venue",
        &[
            ("札幌", "01"),
            ("函館", "02"),
            ("福島", "03"),
            ("新潟", "04"),
            ("東京", "05"),
            ("中山", "06"),
            ("中京", "07"),
            ("京都", "08"),
            ("阪神", "09"),
            ("小倉", "10"),
        ],
    )
});

/// NAR regional racecourse names to `JyoCD` codes.
pub static NAR_VENUES: LazyLock<CodeTable> = LazyLock::new(|| {
    CodeTable::new(
        "NAR venue",
        &[
            ("門別", "30"),
            ("北見", "31"),
            ("岩見沢", "32"),
            ("帯広", "33"),
            ("旭川", "34"),
            ("盛岡", "35"),
            ("水沢", "36"),
            ("上山", "37"),
            ("三条", "38"),
            ("足利", "39"),
            ("宇都宮", "40"),
            ("高崎", "41"),
            ("浦和", "42"),
            ("船橋", "43"),
            ("大井", "44"),
            ("川崎", "45"),
            ("金沢", "46"),
            ("笠松", "47"),
            ("名古屋", "48"),
            ("園田", "49"),
            ("姫路", "50"),
            ("益田", "51"),
            ("福山", "52"),
            ("高知", "53"),
            ("佐賀", "54"),
            ("荒尾", "55"),
            ("中津", "56"),
            ("札幌(地)", "57"),
        ],
    )
});

/// Combined JRA + NAR venue table.
pub static ALL_VENUES: LazyLock<CodeTable> = LazyLock::new(|| {
    let mut entries: Vec<(&'static str, &'static str)> = Vec::new();
    entries.extend(&JRA_VENUES.entries);
    entries.extend(&NAR_VENUES.entries);
    CodeTable::new("venue", &entries)
});

/// Race grade names to `GradeCD` codes. Keys cover both `G1` and `GI` forms.
pub static GRADES: LazyLock<CodeTable> = LazyLock::new(|| {
    CodeTable::new(
        "grade",
        &[
            ("G1", "A"),
            ("GI", "A"),
            ("G2", "B"),
            ("GII", "B"),
            ("G3", "C"),
            ("GIII", "C"),
            ("リステッド", "D"),
            ("オープン特別", "E"),
            ("3勝クラス", "F"),
            ("2勝クラス", "G"),
            ("1勝クラス", "H"),
            ("未勝利", "I"),
            ("新馬", "J"),
        ],
    )
});

/// Shared reference to the JRA venue table.
pub fn jra_venues() -> &'static CodeTable {
    LazyLock::force(&JRA_VENUES)
}

/// Shared reference to the NAR venue table.
pub fn nar_venues() -> &'static CodeTable {
    LazyLock::force(&NAR_VENUES)
}

/// Shared reference to the combined venue table.
pub fn all_venues() -> &'static CodeTable {
    LazyLock::force(&ALL_VENUES)
}

/// Shared reference to the grade table.
pub fn grades() -> &'static CodeTable {
    LazyLock::force(&GRADES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jra_venue_codes() {
        assert_eq!(JRA_VENUES.code("東京"), Some("05"));
        assert_eq!(JRA_VENUES.code("小倉"), Some("10"));
        assert_eq!(JRA_VENUES.code("大井"), None);
    }

    #[test]
    fn test_nar_venue_codes() {
        assert_eq!(NAR_VENUES.code("大井"), Some("44"));
        assert_eq!(NAR_VENUES.code("札幌(地)"), Some("57"));
    }

    #[test]
    fn test_combined_table_spans_both() {
        assert_eq!(ALL_VENUES.code("東京"), Some("05"));
        assert_eq!(ALL_VENUES.code("大井"), Some("44"));
    }

    #[test]
    fn test_grade_case_fold() {
        assert_eq!(GRADES.code("G1"), Some("A"));
        assert_eq!(GRADES.code("g1"), Some("A"));
        assert_eq!(GRADES.code("GIII"), Some("C"));
        assert_eq!(GRADES.code("リステッド"), Some("D"));
    }

    #[test]
    fn test_resolve_unknown_lists_names() {
        let err = JRA_VENUES.resolve("豊橋").unwrap_err();
        match err {
            QueryError::UnknownName { table, valid, .. } => {
                assert_eq!(table, "venue");
                assert_eq!(valid.len(), 10);
                assert!(valid.contains(&"東京".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_suggestion_for_near_miss() {
        // One character off a two-character name
        let err = JRA_VENUES.resolve("東亰").unwrap_err();
        match err {
            QueryError::UnknownName { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("東京"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
