//! Keyword-based market taxonomy classifier.
//!
//! Matches category, tag and title text from every leg against a keyword
//! table. First matching rule wins, so more specific rules come first.

use serde::{Deserialize, Serialize};

use crate::data::RawDecisionRow;

/// Taxonomy tag consumed by segmentation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Taxonomy {
    pub domain: String,
    pub subdomain: String,
    pub topic: String,
}

impl Taxonomy {
    pub fn new(domain: &str, subdomain: &str, topic: &str) -> Self {
        Self {
            domain: domain.to_string(),
            subdomain: subdomain.to_string(),
            topic: topic.to_string(),
        }
    }

    pub fn other() -> Self {
        Self::new("other", "other", "other")
    }
}

/// Market metadata gathered from all legs of a decision.
#[derive(Debug, Clone, Default)]
pub struct MarketMeta {
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub titles: Vec<String>,
}

impl MarketMeta {
    pub fn from_row(row: &RawDecisionRow) -> Self {
        let mut meta = Self::default();
        for leg in &row.legs {
            meta.categories.extend(leg.category.iter().cloned());
            meta.tags.extend(leg.tags.iter().cloned());
            meta.titles.extend(leg.title.iter().cloned());
        }
        meta
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.tags.is_empty() && self.titles.is_empty()
    }

    fn haystack(&self) -> String {
        self.categories
            .iter()
            .chain(&self.tags)
            .chain(&self.titles)
            .map(|s| s.to_lowercase())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Pure mapping from market metadata to a taxonomy tag.
pub trait TaxonomyClassifier: Send + Sync {
    /// `None` when there is no metadata to classify at all.
    fn classify(&self, meta: &MarketMeta) -> Option<Taxonomy>;
}

/// A single keyword rule.
#[derive(Debug, Clone)]
struct KeywordRule {
    keywords: Vec<String>,
    domain: String,
    subdomain: String,
    topic: String,
}

impl KeywordRule {
    fn new(keywords: &[&str], domain: &str, subdomain: &str, topic: &str) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            domain: domain.to_string(),
            subdomain: subdomain.to_string(),
            topic: topic.to_string(),
        }
    }
}

/// Ordered keyword table classifier.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<KeywordRule>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self {
            rules: vec![
                KeywordRule::new(&["nba", "basketball"], "sports", "basketball", "nba"),
                KeywordRule::new(&["nfl", "super bowl"], "sports", "football", "nfl"),
                KeywordRule::new(&["mlb", "baseball"], "sports", "baseball", "mlb"),
                KeywordRule::new(&["nhl", "hockey"], "sports", "hockey", "nhl"),
                KeywordRule::new(&["soccer", "premier league", "champions league"], "sports", "soccer", "soccer"),
                KeywordRule::new(&["sports", "match", " vs "], "sports", "other", "other"),
                KeywordRule::new(&["president", "election", "senate", "governor"], "politics", "elections", "elections"),
                KeywordRule::new(&["politics", "congress", "trump", "biden"], "politics", "policy", "other"),
                KeywordRule::new(&["fed", "fomc", "interest rate", "cpi", "inflation"], "economics", "macro", "rates"),
                KeywordRule::new(&["gdp", "jobs", "unemployment", "economy"], "economics", "macro", "growth"),
                KeywordRule::new(&["bitcoin", "btc", "ethereum", "crypto"], "crypto", "prices", "majors"),
                KeywordRule::new(&["temperature", "weather", "rainfall", "hurricane"], "weather", "climate", "weather"),
                KeywordRule::new(&["oscar", "grammy", "box office", "album"], "culture", "entertainment", "awards"),
            ],
        }
    }
}

impl TaxonomyClassifier for KeywordClassifier {
    fn classify(&self, meta: &MarketMeta) -> Option<Taxonomy> {
        if meta.is_empty() {
            return None;
        }
        let haystack = meta.haystack();
        let hit = self
            .rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| haystack.contains(k.as_str())));

        Some(match hit {
            Some(rule) => Taxonomy::new(&rule.domain, &rule.subdomain, &rule.topic),
            None => Taxonomy::other(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(categories: &[&str], titles: &[&str]) -> MarketMeta {
        MarketMeta {
            categories: categories.iter().map(|s| s.to_string()).collect(),
            tags: vec![],
            titles: titles.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_classify_by_title() {
        let classifier = KeywordClassifier::default();
        let tag = classifier
            .classify(&meta(&[], &["Will the Fed cut rates in March?"]))
            .unwrap();
        assert_eq!(tag.domain, "economics");
        assert_eq!(tag.topic, "rates");
    }

    #[test]
    fn test_first_rule_wins() {
        let classifier = KeywordClassifier::default();
        let tag = classifier.classify(&meta(&["Sports"], &["NBA Finals winner"])).unwrap();
        assert_eq!(tag.subdomain, "basketball");
    }

    #[test]
    fn test_unmatched_and_empty() {
        let classifier = KeywordClassifier::default();
        assert_eq!(
            classifier.classify(&meta(&["misc"], &["Something odd"])),
            Some(Taxonomy::other())
        );
        assert_eq!(classifier.classify(&MarketMeta::default()), None);
    }
}
