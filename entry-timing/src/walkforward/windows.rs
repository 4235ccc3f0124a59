//! Walk-forward window generation.
//!
//! Windows are defined by row position over the chronologically sorted
//! dataset, not by timestamp values.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::config::WalkForwardConfig;

/// A single window with train/valid/test ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkForwardWindow {
    /// Candidate number (1-indexed), before any window is skipped.
    pub candidate_num: usize,
    /// First row of the window.
    pub start: usize,
    pub train: Range<usize>,
    pub valid: Range<usize>,
    pub test: Range<usize>,
}

impl WalkForwardWindow {
    /// One past the last row of the window.
    pub fn end(&self) -> usize {
        self.test.end
    }
}

/// Generator for walk-forward windows.
pub struct WalkForwardWindows {
    train_count: usize,
    valid_count: usize,
    test_count: usize,
    stride: usize,
    total_rows: usize,
}

impl WalkForwardWindows {
    pub fn new(config: &WalkForwardConfig, total_rows: usize) -> Self {
        Self {
            train_count: config.train_count,
            valid_count: config.valid_count,
            test_count: config.test_count,
            stride: config.stride,
            total_rows,
        }
    }

    fn size(&self) -> usize {
        self.train_count + self.valid_count + self.test_count
    }

    /// Every offset where a full window fits.
    pub fn generate(&self) -> Vec<WalkForwardWindow> {
        let size = self.size();
        if self.stride == 0 || size == 0 || size > self.total_rows {
            return Vec::new();
        }

        (0..=self.total_rows - size)
            .step_by(self.stride)
            .enumerate()
            .map(|(i, start)| {
                let train_end = start + self.train_count;
                let valid_end = train_end + self.valid_count;
                WalkForwardWindow {
                    candidate_num: i + 1,
                    start,
                    train: start..train_end,
                    valid: train_end..valid_end,
                    test: valid_end..valid_end + self.test_count,
                }
            })
            .collect()
    }
}
