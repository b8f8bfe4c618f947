// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Capture log implementation.

use crate::invocation::{CapturedInvocation, CapturedOutcome, InvocationRecord};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

/// Capture log for recording tool invocations
pub struct CaptureLog {
    start: Instant,
    records: Arc<Mutex<Vec<InvocationRecord>>>,
    file_writer: Option<Arc<Mutex<BufWriter<File>>>>,
}

impl CaptureLog {
    /// Create a new in-memory capture log
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            records: Arc::new(Mutex::new(Vec::new())),
            file_writer: None,
        }
    }

    /// Create a capture log that also appends to a file (JSONL format)
    pub fn with_file(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            start: Instant::now(),
            records: Arc::new(Mutex::new(Vec::new())),
            file_writer: Some(Arc::new(Mutex::new(BufWriter::new(file)))),
        })
    }

    /// Record an invocation and return its sequence number
    pub fn record(&self, invocation: CapturedInvocation, outcome: CapturedOutcome) -> u64 {
        let mut records = self.records.lock();
        let seq = records.len() as u64;
        let record = InvocationRecord {
            seq,
            timestamp: SystemTime::now(),
            elapsed: self.start.elapsed(),
            invocation,
            outcome,
        };

        // A broken capture file must never fail the run being captured.
        if let Some(ref writer) = self.file_writer {
            let mut w = writer.lock();
            if let Ok(json) = serde_json::to_string(&record) {
                let _ = writeln!(w, "{}", json);
                let _ = w.flush();
            }
        }

        records.push(record);
        seq
    }

    /// Get all captured records
    pub fn records(&self) -> Vec<InvocationRecord> {
        self.records.lock().clone()
    }

    /// Get the last N records
    pub fn last(&self, n: usize) -> Vec<InvocationRecord> {
        let all = self.records.lock();
        all.iter().rev().take(n).rev().cloned().collect()
    }

    /// Records made on behalf of one scenario, in invocation order
    pub fn for_scenario(&self, scenario: &str) -> Vec<InvocationRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.invocation.scenario == scenario)
            .cloned()
            .collect()
    }

    /// Records whose invocation did not exit cleanly
    pub fn failures(&self) -> Vec<InvocationRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| !r.outcome.is_success())
            .cloned()
            .collect()
    }

    /// Count records matching a predicate
    pub fn count<F: Fn(&InvocationRecord) -> bool>(&self, pred: F) -> usize {
        self.records.lock().iter().filter(|r| pred(r)).count()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Default for CaptureLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CaptureLog {
    fn clone(&self) -> Self {
        Self {
            start: self.start,
            records: Arc::clone(&self.records),
            file_writer: self.file_writer.as_ref().map(Arc::clone),
        }
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
