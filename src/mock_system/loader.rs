// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loading seams
//!
//! The pipeline never parses or executes module text itself. It
//! consumes two narrow interfaces: [`DynamicLoader`], the asynchronous
//! load-and-evaluate primitive of the host runtime, and
//! [`SourceReader`], the synchronous text read used by the ESM
//! detector. [`StaticLoader`] is a map-backed loader for tests and for
//! embedders that pre-register namespaces.

use crate::error::{MockError, Result};
use crate::exports::ExportSet;
use async_trait::async_trait;
use dashmap::DashMap;

/// The host runtime's dynamic-import primitive.
#[async_trait]
pub trait DynamicLoader: Send + Sync {
    /// Load and evaluate the module at a resolved location, returning
    /// its real export set. Fails if the module cannot be evaluated.
    async fn load(&self, location: &str) -> Result<ExportSet>;
}

/// Synchronous source-text access for the ESM detector.
pub trait SourceReader: Send + Sync {
    /// Read the text content at a resolved location
    fn read_text(&self, location: &str) -> std::io::Result<String>;
}

/// [`SourceReader`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read_text(&self, location: &str) -> std::io::Result<String> {
        let path = location.strip_prefix("file://").unwrap_or(location);
        std::fs::read_to_string(path)
    }
}

/// [`DynamicLoader`] serving pre-registered export sets.
///
/// Loading a location that was never registered fails, matching a
/// loader that cannot evaluate the module.
#[derive(Default)]
pub struct StaticLoader {
    modules: DashMap<String, ExportSet>,
}

impl StaticLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the export set served for a location
    pub fn insert(&self, location: impl Into<String>, exports: ExportSet) {
        self.modules.insert(location.into(), exports);
    }

    /// Whether a location has a registered export set
    pub fn contains(&self, location: &str) -> bool {
        self.modules.contains_key(location)
    }
}

#[async_trait]
impl DynamicLoader for StaticLoader {
    async fn load(&self, location: &str) -> Result<ExportSet> {
        self.modules
            .get(location)
            .map(|entry| entry.clone())
            .ok_or_else(|| MockError::load(location, "module is not registered with this loader"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use tempfile::tempdir;

    #[test]
    fn test_fs_reader_strips_file_scheme() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("mod.js");
        std::fs::write(&file, "export default 1").unwrap();

        let plain = file.to_string_lossy().into_owned();
        let with_scheme = format!("file://{plain}");
        assert_eq!(FsReader.read_text(&plain).unwrap(), "export default 1");
        assert_eq!(FsReader.read_text(&with_scheme).unwrap(), "export default 1");
    }

    #[tokio::test]
    async fn test_static_loader_serves_registered_exports() {
        let loader = StaticLoader::new();
        let exports: ExportSet = [("answer", Value::from(42.0))].into_iter().collect();
        loader.insert("/srv/app/answer.js", exports.clone());

        assert_eq!(loader.load("/srv/app/answer.js").await.unwrap(), exports);
        assert!(loader.load("/srv/app/other.js").await.is_err());
    }
}
