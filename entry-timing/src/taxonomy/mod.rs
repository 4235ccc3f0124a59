//! Market taxonomy tagging.
//!
//! Segmentation only needs a `{domain, subdomain, topic}` tag per decision;
//! how that tag is produced is behind the [`TaxonomyClassifier`] trait.

pub mod classifier;

pub use classifier::{KeywordClassifier, MarketMeta, Taxonomy, TaxonomyClassifier};
