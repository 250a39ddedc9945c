//! Diagnostic names and operation timing
//!
//! Every facade call and batch is timed under an item name of the form
//! `"<shard>:<operation>"`. Names are built by free functions; timings go
//! to `tracing` at trace level.

use std::time::Instant;

/// Prefix for facade operation names
pub const OPERATION_PREFIX: &str = "redis_";

/// Prefix for batch labels and the commands queued in them
pub const PIPELINE_PREFIX: &str = "pipeline_";

/// `"<shard>:<operation>"`
pub fn item_name(shard: &str, operation: &str) -> String {
    format!("{}:{}", shard, operation)
}

/// Name of a facade operation, e.g. `redis_get`
pub fn operation_name(operation: &str) -> String {
    format!("{}{}", OPERATION_PREFIX, operation)
}

/// Label of a batch started by `origin`, e.g. `pipeline_incr_expire`
pub fn pipeline_label(origin: &str) -> String {
    format!("{}{}", PIPELINE_PREFIX, origin)
}

/// Name of a command queued in a batch, e.g. `pipeline_EXPIRE`
pub fn pipeline_command(command: &str) -> String {
    format!("{}{}", PIPELINE_PREFIX, command)
}

/// Running timer for one probe item
pub struct Probe {
    item: String,
    started: Instant,
}

impl Probe {
    /// Start timing `item`
    pub fn start(item: String) -> Self {
        Self {
            item,
            started: Instant::now(),
        }
    }

    /// Record the outcome
    pub fn finish(self, success: bool) {
        tracing::trace!(
            item = %self.item,
            elapsed_us = self.started.elapsed().as_micros() as u64,
            success,
            "probe"
        );
    }
}
