//! Counterfactual entry-timing labels.
//!
//! Labels are synthesised per decision by scanning forward within the
//! decision's own series:
//! - fixed wall-clock horizons (15m / 1h / 3h)
//! - a resolution-anchored window capped at seven days
//! - a phase-dependent policy window that defines the buy-now target

pub mod phase;
pub mod summary;
pub mod synthesizer;

pub use phase::{policy_window_hours, Phase};
pub use summary::{HorizonSummary, LabelSummary};
pub use synthesizer::{
    horizon_key, HorizonLabel, LabelSynthesizer, LabelingOutput, Labels, ResolutionAnchoredLabel,
};
