//! Window planning and validation
//!
//! Windows tile the timeline in time order with no shared steps:
//!
//! ```text
//! | train 0 | embargo | validate 0 | train 1 | embargo | validate 1 | ...
//! ```
//!
//! Every step of a window's validation range comes before every step of
//! any later window's training range.

use crate::error::{Result, WalkForwardError};
use log::debug;
use meridian_core::{EvaluationWindow, StepRange};
use serde::{Deserialize, Serialize};

/// Window layout parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub train_len: u64,
    pub validate_len: u64,
    /// Steps skipped between training and validation
    pub embargo: u64,
    /// Stop after this many windows
    pub max_windows: Option<usize>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            train_len: 200,
            validate_len: 100,
            embargo: 0,
            max_windows: None,
        }
    }
}

/// Lay windows over `span`, dropping a trailing partial window
pub fn plan_windows(span: StepRange, config: &WindowConfig) -> Result<Vec<EvaluationWindow>> {
    if config.train_len == 0 || config.validate_len == 0 {
        return Err(WalkForwardError::InvalidWindows(format!(
            "train_len and validate_len must be positive (got {} and {})",
            config.train_len, config.validate_len
        )));
    }

    let mut windows = Vec::new();
    let mut cursor = span.start;
    loop {
        if config.max_windows.is_some_and(|max| windows.len() >= max) {
            break;
        }
        let train = StepRange::new(cursor, cursor + config.train_len);
        let validate_start = train.end + config.embargo;
        let validate = StepRange::new(validate_start, validate_start + config.validate_len);
        if validate.end > span.end {
            break;
        }
        windows.push(EvaluationWindow::new(windows.len(), train, validate));
        cursor = validate.end;
    }

    if windows.is_empty() {
        return Err(WalkForwardError::InvalidWindows(format!(
            "timeline {}..{} too short for one window of {} + {} + {} steps",
            span.start, span.end, config.train_len, config.embargo, config.validate_len
        )));
    }

    debug!("[WALKFWD] Planned {} windows over {}..{}", windows.len(), span.start, span.end);
    Ok(windows)
}

/// Check externally supplied windows
pub fn validate_windows(windows: &[EvaluationWindow], span: StepRange) -> Result<()> {
    if windows.is_empty() {
        return Err(WalkForwardError::InvalidWindows("no windows".to_string()));
    }

    for (position, window) in windows.iter().enumerate() {
        let index = window.index;
        if index != position {
            return Err(WalkForwardError::InvalidWindows(format!(
                "window at position {} has index {}",
                position, index
            )));
        }
        if window.train.is_empty() || window.validate.is_empty() {
            return Err(WalkForwardError::InvalidWindows(format!(
                "window {} has an empty range",
                index
            )));
        }
        if !window.train.precedes(&window.validate) {
            return Err(WalkForwardError::InvalidWindows(format!(
                "window {} validates before its training ends",
                index
            )));
        }
        if window.train.start < span.start || window.validate.end > span.end {
            return Err(WalkForwardError::InvalidWindows(format!(
                "window {} falls outside the timeline {}..{}",
                index, span.start, span.end
            )));
        }
        if let Some(previous) = position.checked_sub(1).map(|p| &windows[p])
            && !previous.validate.precedes(&window.train)
        {
            return Err(WalkForwardError::InvalidWindows(format!(
                "window {} trains on steps at or before window {}'s validation",
                index, previous.index
            )));
        }
    }
    Ok(())
}
