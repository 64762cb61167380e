// Word frequencies for the word cloud

use crate::record::Record;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("valid separator regex"));
static LETTERS_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zà-ÿñ]+$").expect("valid word regex"));

/// Token -> occurrences
pub type WordCounts = BTreeMap<String, usize>;

/// Lowercase and split on runs of non-word characters
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    SEPARATOR
        .split(&lower)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Letters only, accented Latin letters and ñ included
pub fn is_valid_word(word: &str) -> bool {
    LETTERS_ONLY.is_match(word)
}

/// Count valid words across the free text of the given records
pub fn extract<'a, I>(records: I) -> WordCounts
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut counts = WordCounts::new();
    for record in records {
        if record.free_text.is_empty() {
            continue;
        }
        for word in tokenize(&record.free_text) {
            if is_valid_word(&word) {
                *counts.entry(word).or_insert(0) += 1;
            }
        }
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedWord {
    pub word: String,
    pub count: usize,
    pub weight: f64,
}

/// Most frequent words first, weighted for display
pub fn cloud_list(counts: &WordCounts, limit: usize) -> Vec<WeightedWord> {
    let mut entries: Vec<(&String, &usize)> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    entries
        .into_iter()
        .take(limit)
        .map(|(word, count)| WeightedWord {
            word: word.clone(),
            count: *count,
            weight: ((*count + 1) as f64).ln() * 6.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RawRow, normalize};

    fn records_with(texts: &[Option<&str>]) -> Vec<Record> {
        let rows: Vec<RawRow> = texts
            .iter()
            .map(|t| RawRow::new("2023-01-02 10:00:00", Some("autor"), *t))
            .collect();
        normalize(&rows)
    }

    #[test]
    fn test_extract_letters_only() {
        let records = records_with(&[Some("café gato123 el-niño ÑOÑO")]);
        let counts = extract(&records);

        let expected: WordCounts = [("café", 1), ("el", 1), ("niño", 1), ("ñoño", 1)]
            .into_iter()
            .map(|(w, c)| (w.to_string(), c))
            .collect();
        assert_eq!(counts, expected);
    }

    #[test]
    fn test_extract_accumulates_across_records() {
        let records = records_with(&[Some("Historia de Chile"), Some("historia  universal!"), None, Some("")]);
        let counts = extract(&records);

        assert_eq!(counts.get("historia"), Some(&2));
        assert_eq!(counts.get("de"), Some(&1));
        assert_eq!(counts.get("chile"), Some(&1));
        assert_eq!(counts.get("universal"), Some(&1));
        assert_eq!(counts.len(), 4);
    }

    #[test]
    fn test_extract_no_valid_words() {
        let records = records_with(&[Some("1234 -- abc123 !!"), None]);
        assert!(extract(&records).is_empty());
        assert!(extract(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_tokenize_and_validate() {
        assert_eq!(tokenize("Ñandú, CAFÉ;x_1"), vec!["ñandú", "café", "x_1"]);
        assert!(is_valid_word("ñandú"));
        assert!(!is_valid_word("x_1"));
        assert!(!is_valid_word("abc123"));
        assert!(!is_valid_word(""));
    }

    #[test]
    fn test_cloud_list_orders_by_count() {
        let records = records_with(&[Some("libro libro libro mapa mapa atlas")]);
        let list = cloud_list(&extract(&records), 2);

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].word, "libro");
        assert_eq!(list[0].count, 3);
        assert_eq!(list[1].word, "mapa");
        assert!((list[0].weight - 4f64.ln() * 6.0).abs() < 1e-9);
    }
}
