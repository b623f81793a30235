//! Tracing and metrics sink
//!
//! Process-wide observability state shared by every consumer thread: atomic
//! queue-depth counters and per-channel timed decode sections. All operations
//! are lock-free and safe to call from any thread. The number of per-channel
//! section keys is fixed; channels at or beyond the bound share one overflow
//! key so the metric cardinality never grows with the channel count.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use crate::types::ChannelId;

/// Number of per-channel decode section keys; the last one is the overflow
/// key shared by all channels at or beyond the bound
pub const MAX_DECODER_SECTIONS: usize = 20;

/// Named atomic counters tracking what is currently queued for inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceVariable {
    /// Data frames queued from the consumer to the inspection stage
    QueuedDataFrames,
    /// Decoded signals queued from the consumer to the inspection stage
    QueuedSignals,
    /// Raw CAN frames queued from the consumer to the inspection stage
    QueuedCanRawFrames,
}

#[derive(Debug, Default)]
struct SectionStats {
    /// Nanoseconds since module creation when the section was last entered
    started_ns: AtomicU64,
    /// Accumulated time spent in the section
    total_ns: AtomicU64,
    /// Number of completed begin/end pairs
    count: AtomicU64,
}

/// Lock-free metrics sink
///
/// Obtain the process-wide instance with [`TraceModule::get`]; standalone
/// instances can be created for isolated measurements.
#[derive(Debug)]
pub struct TraceModule {
    queued_data_frames: AtomicU64,
    queued_signals: AtomicU64,
    queued_can_raw_frames: AtomicU64,
    sections: [SectionStats; MAX_DECODER_SECTIONS],
    epoch: Instant,
}

static GLOBAL_TRACE: OnceLock<Arc<TraceModule>> = OnceLock::new();

impl TraceModule {
    pub fn new() -> Self {
        Self {
            queued_data_frames: AtomicU64::new(0),
            queued_signals: AtomicU64::new(0),
            queued_can_raw_frames: AtomicU64::new(0),
            sections: Default::default(),
            epoch: Instant::now(),
        }
    }

    /// The process-wide trace module, created on first use
    pub fn get() -> Arc<TraceModule> {
        Arc::clone(GLOBAL_TRACE.get_or_init(|| Arc::new(TraceModule::new())))
    }

    fn counter(&self, variable: TraceVariable) -> &AtomicU64 {
        match variable {
            TraceVariable::QueuedDataFrames => &self.queued_data_frames,
            TraceVariable::QueuedSignals => &self.queued_signals,
            TraceVariable::QueuedCanRawFrames => &self.queued_can_raw_frames,
        }
    }

    pub fn increment(&self, variable: TraceVariable) {
        self.add(variable, 1);
    }

    pub fn decrement(&self, variable: TraceVariable) {
        self.subtract(variable, 1);
    }

    pub fn add(&self, variable: TraceVariable, value: u64) {
        self.counter(variable).fetch_add(value, Ordering::Relaxed);
    }

    pub fn subtract(&self, variable: TraceVariable, value: u64) {
        self.counter(variable).fetch_sub(value, Ordering::Relaxed);
    }

    /// Current value of a counter
    pub fn value(&self, variable: TraceVariable) -> u64 {
        self.counter(variable).load(Ordering::Relaxed)
    }

    /// Section key for a channel, collapsing onto the overflow key
    pub fn section_for_channel(channel_id: ChannelId) -> usize {
        (channel_id as usize).min(MAX_DECODER_SECTIONS - 1)
    }

    /// Enter the decode section for a channel
    pub fn section_begin(&self, section: usize) {
        let now = self.epoch.elapsed().as_nanos() as u64;
        self.sections[section].started_ns.store(now, Ordering::Relaxed);
    }

    /// Leave the decode section for a channel, accumulating elapsed time
    pub fn section_end(&self, section: usize) {
        let now = self.epoch.elapsed().as_nanos() as u64;
        let stats = &self.sections[section];
        let started = stats.started_ns.load(Ordering::Relaxed);
        stats
            .total_ns
            .fetch_add(now.saturating_sub(started), Ordering::Relaxed);
        stats.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Completed begin/end pairs for a section
    pub fn section_count(&self, section: usize) -> u64 {
        self.sections[section].count.load(Ordering::Relaxed)
    }

    /// Accumulated nanoseconds for a section
    pub fn section_total_ns(&self, section: usize) -> u64 {
        self.sections[section].total_ns.load(Ordering::Relaxed)
    }
}

impl Default for TraceModule {
    fn default() -> Self {
        Self::new()
    }
}
