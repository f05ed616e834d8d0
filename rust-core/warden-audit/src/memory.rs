// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Bounded in-memory audit log.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::AuditError;
use crate::record::{AuditOutcome, AuditRecord};
use crate::sink::AuditSink;

/// Default number of records retained.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Thread-safe ring buffer of audit records. The oldest record is dropped
/// once `capacity` is reached. Clones share the buffer.
#[derive(Debug, Clone)]
pub struct MemoryAuditLog {
    entries: Arc<Mutex<VecDeque<AuditRecord>>>,
    capacity: usize,
}

impl MemoryAuditLog {
    /// Create a log holding at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(4096)))),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Store a record synchronously.
    pub fn record(&self, record: AuditRecord) {
        let mut entries = self.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(record);
    }

    /// Snapshot of all retained records, oldest first.
    pub fn entries(&self) -> Vec<AuditRecord> {
        self.lock().iter().cloned().collect()
    }

    /// Retained records with the given outcome, oldest first.
    pub fn with_outcome(&self, outcome: AuditOutcome) -> Vec<AuditRecord> {
        self.lock()
            .iter()
            .filter(|r| r.outcome == outcome)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<AuditRecord>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryAuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl AuditSink for MemoryAuditLog {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.record(record);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
