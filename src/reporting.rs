//! Types for reporting progress and outcomes to the user.
//!
//! The extraction pipeline never writes progress to a global stream. Instead, a
//! [`Progress`] implementation is passed in: [`LogProgress`] for the command line
//! tool, [`NoProgress`] when nothing should be reported.

use crate::ranges::Roi;

/// How often [`LogProgress`] reports, in regions.
pub const PROGRESS_INTERVAL: usize = 100;

/// Receives progress events from the extraction pipeline.
pub trait Progress {
    /// Called before region number `index` (0-based) is processed.
    fn roi_started(&mut self, index: usize, roi: &Roi);
    /// Called once all `total` regions have been processed.
    fn finished(&mut self, total: usize);
}

/// Logs every [`PROGRESS_INTERVAL`] regions at `info` level.
#[derive(Clone, Debug)]
pub struct LogProgress {
    interval: usize,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::with_interval(PROGRESS_INTERVAL)
    }

    /// Report every `interval` regions; an interval of zero is treated as one.
    pub fn with_interval(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
        }
    }

    /// Whether region `index` is a reporting point.
    pub fn reports_at(&self, index: usize) -> bool {
        index % self.interval == 0
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for LogProgress {
    fn roi_started(&mut self, index: usize, roi: &Roi) {
        if self.reports_at(index) {
            log::info!("Processed {} regions of interest", index);
        }
        log::debug!("counting region '{}' ({}:{}-{})", roi.name, roi.seqname, roi.start, roi.end);
    }

    fn finished(&mut self, total: usize) {
        log::info!("Completed processing data for {} regions of interest.", total);
    }
}

/// Reports nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn roi_started(&mut self, _index: usize, _roi: &Roi) {}
    fn finished(&mut self, _total: usize) {}
}

/// The [`CommandOutput<U>`] type output is generic over some data output
/// from a command, and a [`Report`] that reports information to the user.
#[derive(Debug)]
pub struct CommandOutput<U> {
    pub value: U,
    pub report: Report,
}

impl<U> CommandOutput<U> {
    pub fn new(value: U, report: Report) -> Self {
        Self { value, report }
    }
}

/// A type to (semi) standardize reporting to the user.
#[derive(Debug, Default)]
pub struct Report {
    entries: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, message: String) {
        self.entries.push(message)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
