// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Mocked module identities
//!
//! [`ModuleMocker`] is the pipeline's entry point: one
//! [`build_mocked_identity`](ModuleMocker::build_mocked_identity) call
//! per mocked-import request registers every substitute export set,
//! records the session, and returns the rewritten identifier the host
//! runtime's dynamic loader must be given. [`purge`](ModuleMocker::purge)
//! invalidates everything a session created.

use crate::error::{MockError, Result};
use crate::mock_system::cache::MockCache;
use crate::mock_system::key::{rewritten_identifier, session_id_of, SessionRecord};
use crate::mock_system::loader::{DynamicLoader, FsReader, SourceReader};
use crate::mock_system::registrar::Registrar;
use crate::mock_system::resolver::Resolver;
use crate::value::Value;
use indexmap::IndexMap;
use std::sync::Arc;

/// Options for one mocked-identity request.
#[derive(Debug, Clone)]
pub struct MockOptions {
    /// Skip loading live exports; the composed set is the mock alone
    pub strict: bool,
    /// Reuse an explicit session id instead of drawing a fresh one
    pub key: Option<u64>,
    /// Fail on unresolvable dependency specifiers (default true);
    /// false registers them with a not-found placeholder instead
    pub is_module_not_found_error: bool,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            strict: false,
            key: None,
            is_module_not_found_error: true,
        }
    }
}

/// Registers mock export sets and builds mocked module identities.
pub struct ModuleMocker {
    resolver: Box<dyn Resolver>,
    loader: Box<dyn DynamicLoader>,
    reader: Box<dyn SourceReader>,
    cache: Arc<MockCache>,
}

impl ModuleMocker {
    /// Create a mocker over a resolver and a dynamic loader, reading
    /// source text from the local filesystem
    pub fn new(
        resolver: impl Resolver + 'static,
        loader: impl DynamicLoader + 'static,
    ) -> Self {
        Self {
            resolver: Box::new(resolver),
            loader: Box::new(loader),
            reader: Box::new(FsReader),
            cache: Arc::new(MockCache::new()),
        }
    }

    /// Replace the source reader used by ESM detection
    pub fn with_reader(mut self, reader: impl SourceReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    /// Share an existing cache instead of the mocker's own
    pub fn with_cache(mut self, cache: Arc<MockCache>) -> Self {
        self.cache = cache;
        self
    }

    /// The cache holding registered mocks and session records
    pub fn cache(&self) -> &Arc<MockCache> {
        &self.cache
    }

    fn registrar(&self) -> Registrar<'_> {
        Registrar {
            cache: &self.cache,
            resolver: self.resolver.as_ref(),
            loader: self.loader.as_ref(),
            reader: self.reader.as_ref(),
        }
    }

    /// Build a mocked identity for `target`, resolved against `parent`.
    ///
    /// Registers the global mocks first, then the direct mocks, all
    /// under one session id, stores the session record, and returns
    /// `<resolvedTarget>?esmk=<session>` for the dynamic loader. An
    /// unresolvable target fails regardless of options; an unresolvable
    /// dependency fails before any later entry of its map is
    /// registered, unless `is_module_not_found_error` is disabled.
    pub async fn build_mocked_identity(
        &self,
        parent: &str,
        target: &str,
        direct_mocks: &IndexMap<String, Value>,
        global_mocks: &IndexMap<String, Value>,
        options: &MockOptions,
    ) -> Result<String> {
        let target_location = self
            .resolver
            .resolve(target, parent)
            .ok_or_else(|| MockError::module_not_found(target, parent))?;

        let session = match options.key {
            Some(session) => session,
            None => self.cache.next_session_id(),
        };

        let registrar = self.registrar();
        let global_keys = registrar
            .register_all(parent, session, 0, global_mocks, options)
            .await?;
        let module_keys = registrar
            .register_all(parent, session, global_keys.len() as u32, direct_mocks, options)
            .await?;

        let record = SessionRecord {
            target: target_location.clone(),
            session,
            global_keys,
            module_keys,
        };
        self.cache.set_session(session, record.encode());
        tracing::debug!("created mock session {} for {}", session, target_location);

        Ok(rewritten_identifier(&target_location, session))
    }

    /// Invalidate every registry entry a session created.
    ///
    /// The session record is removed and each of its synthetic keys is
    /// emptied in place. Purging an identifier twice, or one whose
    /// session is already gone, is a no-op.
    pub fn purge(&self, identifier: &str) {
        let Some(session) = session_id_of(identifier) else {
            tracing::warn!("purge: no session id in identifier {}", identifier);
            return;
        };
        let Some(encoded) = self.cache.take_session(session) else {
            return;
        };
        let Some(record) = SessionRecord::decode(&encoded) else {
            tracing::warn!("purge: malformed record for session {}", session);
            return;
        };

        for key in record.all_keys() {
            self.cache.set_mock(key.clone(), None);
        }
        tracing::debug!("purged mock session {}", session);
    }
}
