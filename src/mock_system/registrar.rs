// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Mock registration
//!
//! One registrar call composes and stores one mock export set; the list
//! form walks a mock map strictly sequentially, so dependency indexes
//! and registry writes never race. The next entry's resolution and load
//! only begin after the previous entry's write completed.

use crate::error::{MockError, Result};
use crate::mock_system::cache::MockCache;
use crate::mock_system::compose::compose_exports;
use crate::mock_system::detect::is_module_esm;
use crate::mock_system::key::{DepId, SyntheticKey};
use crate::mock_system::loader::{DynamicLoader, SourceReader};
use crate::mock_system::resolver::Resolver;
use crate::mock_system::MockOptions;
use crate::value::Value;
use indexmap::IndexMap;

/// Borrowed collaborator bundle for one registration pass.
pub(crate) struct Registrar<'a> {
    pub(crate) cache: &'a MockCache,
    pub(crate) resolver: &'a dyn Resolver,
    pub(crate) loader: &'a dyn DynamicLoader,
    pub(crate) reader: &'a dyn SourceReader,
}

impl Registrar<'_> {
    /// Register one dependency: detect format, load the live exports
    /// unless skipped, compose with the mock, store under a synthetic
    /// key, and return the key.
    pub(crate) async fn register_one(
        &self,
        session: u64,
        dep: DepId,
        location: Option<String>,
        mock: &Value,
        options: &MockOptions,
    ) -> Result<String> {
        let is_esm = match location.as_deref() {
            Some(location) => is_module_esm(self.cache, self.resolver, self.reader, location)?,
            None => false,
        };

        let live = match location.as_deref() {
            Some(location) if !options.strict => Some(self.loader.load(location).await?),
            _ => None,
        };

        let is_core = location
            .as_deref()
            .is_some_and(|location| self.resolver.is_core_module(location));
        let composed = compose_exports(live.as_ref(), mock, is_core);

        let key = SyntheticKey {
            location,
            session,
            dep,
            is_esm,
            export_names: composed.export_names(),
        }
        .encode();

        self.cache.set_mock(key.clone(), Some(composed));
        tracing::debug!("registered mock exports under {}", key);

        Ok(key)
    }

    /// Register every entry of a mock map, in the map's own key order,
    /// one at a time. Dependency indexes continue from `first_index`.
    pub(crate) async fn register_all(
        &self,
        parent: &str,
        session: u64,
        first_index: u32,
        mocks: &IndexMap<String, Value>,
        options: &MockOptions,
    ) -> Result<Vec<String>> {
        let mut keys = Vec::with_capacity(mocks.len());

        for (position, (specifier, mock)) in mocks.iter().enumerate() {
            let location = self.resolver.resolve(specifier, parent);
            if location.is_none() && options.is_module_not_found_error {
                return Err(MockError::module_not_found(specifier, parent));
            }

            let dep = DepId::new(first_index + position as u32, specifier.clone());
            keys.push(self.register_one(session, dep, location, mock, options).await?);
        }

        Ok(keys)
    }
}
