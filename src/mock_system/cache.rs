// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Process-wide state for the mocking pipeline
//!
//! One [`MockCache`] holds everything that outlives a single
//! registration call: the mock registry (synthetic key to composed
//! export set), the session table (session id to encoded record), the
//! ESM detection memo and the monotonic session counter. The value is
//! injectable rather than a process global, so tests can run against a
//! fresh instance.

use crate::exports::ExportSet;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared mock registry, session table and detection memo.
pub struct MockCache {
    /// Synthetic key to composed exports; a purged key holds `None`
    mocks: DashMap<String, Option<ExportSet>>,
    /// Session id to encoded session record
    sessions: DashMap<u64, String>,
    /// Resolved location to ESM detection result
    esm: DashMap<String, bool>,
    /// Next session id; monotonic, never reused, never decremented
    next_session: AtomicU64,
}

impl MockCache {
    /// Create an empty cache; session ids start at 1
    pub fn new() -> Self {
        Self {
            mocks: DashMap::new(),
            sessions: DashMap::new(),
            esm: DashMap::new(),
            next_session: AtomicU64::new(1),
        }
    }

    /// Draw the next session id
    pub fn next_session_id(&self) -> u64 {
        self.next_session.fetch_add(1, Ordering::Relaxed)
    }

    /// Store composed exports under a synthetic key.
    ///
    /// Passing `None` empties the slot without deleting it, so a purged
    /// key remains observable as having existed.
    pub fn set_mock(&self, key: impl Into<String>, exports: Option<ExportSet>) {
        self.mocks.insert(key.into(), exports);
    }

    /// Composed exports for a key; `None` for unknown or purged keys
    pub fn get_mock(&self, key: &str) -> Option<ExportSet> {
        self.mocks.get(key).and_then(|entry| entry.clone())
    }

    /// Whether a slot exists for this key, purged or not
    pub fn has_mock(&self, key: &str) -> bool {
        self.mocks.contains_key(key)
    }

    /// All synthetic keys with a slot, in no particular order
    pub fn mock_keys(&self) -> Vec<String> {
        self.mocks.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of registry slots (purged slots included)
    pub fn mock_count(&self) -> usize {
        self.mocks.len()
    }

    /// Number of registry slots still holding exports
    pub fn live_mock_count(&self) -> usize {
        self.mocks.iter().filter(|entry| entry.value().is_some()).count()
    }

    /// Store an encoded session record
    pub fn set_session(&self, session: u64, record: String) {
        self.sessions.insert(session, record);
    }

    /// Read an encoded session record
    pub fn get_session(&self, session: u64) -> Option<String> {
        self.sessions.get(&session).map(|entry| entry.clone())
    }

    /// Remove and return an encoded session record
    pub fn take_session(&self, session: u64) -> Option<String> {
        self.sessions.remove(&session).map(|(_, record)| record)
    }

    /// Memoized ESM detection result for a location
    pub fn esm_get(&self, location: &str) -> Option<bool> {
        self.esm.get(location).map(|entry| *entry)
    }

    /// Record an ESM detection result
    pub fn esm_set(&self, location: impl Into<String>, is_esm: bool) {
        self.esm.insert(location.into(), is_esm);
    }

    /// Drop all registry slots, session records and memo entries.
    ///
    /// The session counter is left alone: ids are never reused.
    pub fn clear(&self) {
        self.mocks.clear();
        self.sessions.clear();
        self.esm.clear();
    }
}

impl Default for MockCache {
    fn default() -> Self {
        Self::new()
    }
}
