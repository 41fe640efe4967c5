// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Synthetic keys and session records
//!
//! Keys and records are structured values inside the pipeline and only
//! become delimited strings at the loader boundary, where a rewritten
//! module identifier must be a plain string. Purge decodes the session
//! record symmetrically.

/// Delimiter between synthetic keys inside a session record
pub const KEY_DELIMITER: &str = "#-#";

/// Placeholder for an empty key list, keeping the record parseable
pub const EMPTY_KEYS: &str = "0";

/// Per-dependency identifier: the position of the specifier within one
/// builder call (continuous across the globals and direct maps, so no
/// two dependencies of a call share an index) plus the specifier it was
/// derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepId {
    /// Zero-based position within the builder call
    pub index: u32,
    /// The specifier as the caller wrote it
    pub specifier: String,
}

impl DepId {
    /// Create a dependency id
    pub fn new(index: u32, specifier: impl Into<String>) -> Self {
        Self {
            index,
            specifier: specifier.into(),
        }
    }
}

/// Identity of one registered mock export set.
///
/// Self-describing: the serialized form carries everything needed to
/// read the registry entry, diagnose it, and invalidate it later.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticKey {
    /// Resolved location of the mocked dependency, if it was found
    pub location: Option<String>,
    /// Session this key belongs to
    pub session: u64,
    /// Per-dependency identifier
    pub dep: DepId,
    /// ESM detection result for the location
    pub is_esm: bool,
    /// Sorted names of the composed exports
    pub export_names: Vec<String>,
}

impl SyntheticKey {
    /// The resolved location, or a placeholder derived from the
    /// dependency id when resolution found nothing
    pub fn location_or_placeholder(&self) -> String {
        match &self.location {
            Some(location) => location.clone(),
            None => format!("file:///{}", self.dep.specifier),
        }
    }

    /// Serialize to the registry key / diagnostic string form
    pub fn encode(&self) -> String {
        let found = match self.location {
            Some(_) => "found".to_string(),
            None => format!("notfound={}", self.dep.specifier),
        };
        let names = if self.export_names.is_empty() {
            "exportNone".to_string()
        } else {
            format!("exportNames={}", self.export_names.join(","))
        };
        format!(
            "{}?esmockKey={}&esmockModuleKey={}:{}&isesm={}&{}&{}",
            self.location_or_placeholder(),
            self.session,
            self.dep.index,
            self.dep.specifier,
            self.is_esm,
            found,
            names
        )
    }
}

/// Everything one builder call created, addressed by its session id.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    /// Resolved location of the target module
    pub target: String,
    /// The session id
    pub session: u64,
    /// Synthetic keys registered for global mocks, in input order
    pub global_keys: Vec<String>,
    /// Synthetic keys registered for direct mocks, in input order
    pub module_keys: Vec<String>,
}

impl SessionRecord {
    /// Serialize to the long-form string stored in the session table
    pub fn encode(&self) -> String {
        format!(
            "{}?key={}?esmockGlobals={}{}esmockModuleKeys={}",
            self.target,
            self.session,
            join_keys(&self.global_keys),
            KEY_DELIMITER,
            join_keys(&self.module_keys),
        )
    }

    /// Parse a long-form record back into its parts
    pub fn decode(record: &str) -> Option<Self> {
        let module_marker = format!("{KEY_DELIMITER}esmockModuleKeys=");
        let (head, module_keys) = record.split_once(&module_marker)?;
        let (head, global_keys) = head.split_once("?esmockGlobals=")?;
        let (target, session) = head.rsplit_once("?key=")?;
        Some(Self {
            target: target.to_string(),
            session: session.parse().ok()?,
            global_keys: split_keys(global_keys),
            module_keys: split_keys(module_keys),
        })
    }

    /// Every synthetic key of the session: globals first, then directs
    pub fn all_keys(&self) -> impl Iterator<Item = &String> {
        self.global_keys.iter().chain(self.module_keys.iter())
    }
}

fn join_keys(keys: &[String]) -> String {
    if keys.is_empty() {
        EMPTY_KEYS.to_string()
    } else {
        keys.join(KEY_DELIMITER)
    }
}

fn split_keys(joined: &str) -> Vec<String> {
    if joined.is_empty() || joined == EMPTY_KEYS {
        Vec::new()
    } else {
        joined.split(KEY_DELIMITER).map(str::to_string).collect()
    }
}

/// The identifier handed back to the caller for the dynamic loader
pub fn rewritten_identifier(target: &str, session: u64) -> String {
    format!("{target}?esmk={session}")
}

/// Extract the session id from a rewritten identifier
pub fn session_id_of(identifier: &str) -> Option<u64> {
    let (_, session) = identifier.split_once("?esmk=")?;
    session.parse().ok()
}
