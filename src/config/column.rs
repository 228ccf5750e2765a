//! Tuning for the entry column.

use std::time::Duration;

use serde::Deserialize;

use crate::column::read_marker::ReadPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Lines rendered beyond each edge of the viewport.
    pub overscan: usize,
    /// Load the next page once the rendered rows end this close to the
    /// last loaded row.
    pub end_reached_threshold: usize,
    pub page_size: usize,
    /// Delay before the loading row below the list appears.
    pub skeleton_delay_ms: u64,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            overscan: 2,
            end_reached_threshold: 5,
            page_size: 30,
            skeleton_delay_ms: 150,
        }
    }
}

impl ListConfig {
    pub fn skeleton_delay(&self) -> Duration {
        Duration::from_millis(self.skeleton_delay_ms)
    }
}

/// Velocities are in rows per second.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrollSeekConfig {
    pub enter_velocity: f64,
    pub exit_velocity: f64,
    /// Scroll pause after which the list counts as resting.
    pub settle_ms: u64,
}

impl Default for ScrollSeekConfig {
    fn default() -> Self {
        Self {
            enter_velocity: 60.0,
            exit_velocity: 20.0,
            settle_ms: 150,
        }
    }
}

impl ScrollSeekConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarkReadConfig {
    pub policy: ReadPolicy,
    /// How long a row must stay visible before it counts as read.
    pub dwell_ms: u64,
}

impl Default for MarkReadConfig {
    fn default() -> Self {
        Self {
            policy: ReadPolicy::Render,
            dwell_ms: 1000,
        }
    }
}

impl MarkReadConfig {
    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }
}
