// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! End-to-end tests for the mock-registration pipeline

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use spacey_mock::{
    DynamicLoader, ExportSet, MockError, MockOptions, ModuleMocker, NodeResolver, Resolver,
    SessionRecord, SourceReader, StaticLoader, Value,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

/// Resolver over a fixed specifier-to-location table
#[derive(Default)]
struct TableResolver {
    table: HashMap<String, String>,
}

impl TableResolver {
    fn with(entries: &[(&str, &str)]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|(specifier, location)| (specifier.to_string(), location.to_string()))
                .collect(),
        }
    }
}

impl Resolver for TableResolver {
    fn resolve(&self, specifier: &str, _parent: &str) -> Option<String> {
        self.table.get(specifier).cloned()
    }

    fn is_core_module(&self, id: &str) -> bool {
        id.strip_prefix("node:").unwrap_or(id) == "fs"
    }
}

/// Reader serving the same ESM source for every location
struct FixedReader(&'static str);

impl SourceReader for FixedReader {
    fn read_text(&self, _location: &str) -> std::io::Result<String> {
        Ok(self.0.to_string())
    }
}

/// Loader that records the interleaving of its load calls
struct RecordingLoader {
    exports: HashMap<String, ExportSet>,
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingLoader {
    fn with(locations: &[&str]) -> Self {
        Self {
            exports: locations
                .iter()
                .map(|location| (location.to_string(), ExportSet::new()))
                .collect(),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl DynamicLoader for RecordingLoader {
    async fn load(&self, location: &str) -> spacey_mock::Result<ExportSet> {
        self.log.lock().push(format!("start:{location}"));
        // A suspension long enough for a concurrent second load to slip
        // in ahead of the end marker, if loads were ever overlapped
        tokio::time::sleep(Duration::from_millis(25)).await;
        self.log.lock().push(format!("end:{location}"));
        self.exports
            .get(location)
            .cloned()
            .ok_or_else(|| MockError::load(location, "unknown location"))
    }
}

/// Loader that must never be called
struct UnreachableLoader;

#[async_trait]
impl DynamicLoader for UnreachableLoader {
    async fn load(&self, location: &str) -> spacey_mock::Result<ExportSet> {
        Err(MockError::load(location, "live loading was supposed to be skipped"))
    }
}

/// A project directory with a target module and two ESM dependencies
fn project_fixture() -> (TempDir, String) {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("main.js"),
        "import { query } from './db.js'\nexport default query\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("db.js"),
        "export const query = () => 'rows'\nexport default { query }\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("log.js"),
        "export const write = () => {}\n",
    )
    .unwrap();
    let parent = dir.path().join("test.js").to_string_lossy().into_owned();
    (dir, parent)
}

fn resolve_fixture(parent: &str, specifier: &str) -> String {
    NodeResolver::new().resolve(specifier, parent).unwrap()
}

fn direct_mocks() -> IndexMap<String, Value> {
    IndexMap::from([
        (
            "./db.js".to_string(),
            Value::Object(
                [("query", Value::function("query", |_| Value::from("mocked")))]
                    .into_iter()
                    .collect(),
            ),
        ),
        (
            "./log.js".to_string(),
            Value::Object(
                [("write", Value::function("write", |_| Value::Undefined))]
                    .into_iter()
                    .collect(),
            ),
        ),
    ])
}

#[tokio::test]
async fn test_identity_builds_against_real_files() {
    let (_dir, parent) = project_fixture();
    let target_location = resolve_fixture(&parent, "./main.js");

    let loader = StaticLoader::new();
    let mut db_exports = ExportSet::new();
    db_exports.insert("query", Value::from("live"));
    loader.insert(resolve_fixture(&parent, "./db.js"), db_exports);
    loader.insert(resolve_fixture(&parent, "./log.js"), ExportSet::new());

    let mocker = ModuleMocker::new(NodeResolver::new(), loader);
    let identity = mocker
        .build_mocked_identity(
            &parent,
            "./main.js",
            &direct_mocks(),
            &IndexMap::new(),
            &MockOptions::default(),
        )
        .await
        .unwrap();

    assert!(identity.starts_with(&target_location));
    let session = spacey_mock::session_id_of(&identity).unwrap();
    assert!(session >= 1);

    // One registry slot per mocked specifier, each holding exports
    assert_eq!(mocker.cache().mock_count(), 2);
    assert_eq!(mocker.cache().live_mock_count(), 2);

    // Named mock entries won over the live ones
    let db_key = mocker
        .cache()
        .mock_keys()
        .into_iter()
        .find(|key| key.contains("db.js"))
        .unwrap();
    assert!(db_key.contains("isesm=true"));
    assert!(db_key.contains("&found&"));
    let composed = mocker.cache().get_mock(&db_key).unwrap();
    assert!(matches!(composed.get("query"), Some(Value::Function(_))));
}

#[tokio::test]
async fn test_purge_clears_exactly_the_session_keys() {
    let (_dir, parent) = project_fixture();

    let loader = StaticLoader::new();
    loader.insert(resolve_fixture(&parent, "./db.js"), ExportSet::new());
    loader.insert(resolve_fixture(&parent, "./log.js"), ExportSet::new());

    let mocker = ModuleMocker::new(NodeResolver::new(), loader);
    let identity = mocker
        .build_mocked_identity(
            &parent,
            "./main.js",
            &direct_mocks(),
            &IndexMap::new(),
            &MockOptions::default(),
        )
        .await
        .unwrap();

    let session = spacey_mock::session_id_of(&identity).unwrap();
    let record = SessionRecord::decode(&mocker.cache().get_session(session).unwrap()).unwrap();
    assert!(record.global_keys.is_empty());
    assert_eq!(record.module_keys.len(), 2);

    mocker.purge(&identity);
    assert_eq!(mocker.cache().get_session(session), None);
    assert_eq!(mocker.cache().mock_count(), 2);
    assert_eq!(mocker.cache().live_mock_count(), 0);

    // Second purge is a no-op
    mocker.purge(&identity);
    assert_eq!(mocker.cache().mock_count(), 2);
    assert_eq!(mocker.cache().live_mock_count(), 0);
}

#[tokio::test]
async fn test_identical_calls_get_disjoint_sessions() {
    let (_dir, parent) = project_fixture();

    let loader = StaticLoader::new();
    loader.insert(resolve_fixture(&parent, "./db.js"), ExportSet::new());
    loader.insert(resolve_fixture(&parent, "./log.js"), ExportSet::new());

    let mocker = ModuleMocker::new(NodeResolver::new(), loader);
    let options = MockOptions::default();
    let first = mocker
        .build_mocked_identity(&parent, "./main.js", &direct_mocks(), &IndexMap::new(), &options)
        .await
        .unwrap();
    let keys_after_first: Vec<String> = mocker.cache().mock_keys();
    let second = mocker
        .build_mocked_identity(&parent, "./main.js", &direct_mocks(), &IndexMap::new(), &options)
        .await
        .unwrap();

    assert_ne!(
        spacey_mock::session_id_of(&first),
        spacey_mock::session_id_of(&second)
    );
    // No second-call key collided with a first-call key
    assert_eq!(mocker.cache().mock_count(), keys_after_first.len() * 2);
}

#[tokio::test]
async fn test_explicit_key_reuses_the_session_id() {
    let (_dir, parent) = project_fixture();

    let loader = StaticLoader::new();
    loader.insert(resolve_fixture(&parent, "./db.js"), ExportSet::new());
    loader.insert(resolve_fixture(&parent, "./log.js"), ExportSet::new());

    let mocker = ModuleMocker::new(NodeResolver::new(), loader);
    let options = MockOptions {
        key: Some(77),
        ..MockOptions::default()
    };
    let identity = mocker
        .build_mocked_identity(&parent, "./main.js", &direct_mocks(), &IndexMap::new(), &options)
        .await
        .unwrap();

    assert!(identity.ends_with("?esmk=77"));
    assert!(mocker.cache().get_session(77).is_some());
}

#[tokio::test]
async fn test_strict_skips_live_loading() {
    let resolver = TableResolver::with(&[
        ("./service.js", "/srv/app/service.js"),
        ("./db.js", "/srv/app/db.js"),
    ]);

    let mocker = ModuleMocker::new(resolver, UnreachableLoader)
        .with_reader(FixedReader("export default 1\n"));
    let options = MockOptions {
        strict: true,
        ..MockOptions::default()
    };
    let mocks = IndexMap::from([("./db.js".to_string(), Value::from("stub"))]);

    let identity = mocker
        .build_mocked_identity("/srv/app/main.js", "./service.js", &mocks, &IndexMap::new(), &options)
        .await
        .unwrap();

    assert!(identity.starts_with("/srv/app/service.js?esmk="));
    let key = mocker.cache().mock_keys().pop().unwrap();
    let composed = mocker.cache().get_mock(&key).unwrap();
    assert_eq!(composed.default_export(), Some(&Value::from("stub")));
}

#[tokio::test]
async fn test_loads_run_strictly_sequentially() {
    let resolver = TableResolver::with(&[
        ("./service.js", "/srv/app/service.js"),
        ("./a.js", "/srv/app/a.js"),
        ("./b.js", "/srv/app/b.js"),
    ]);
    let loader = RecordingLoader::with(&["/srv/app/a.js", "/srv/app/b.js"]);
    let log = Arc::clone(&loader.log);

    let mocker = ModuleMocker::new(resolver, loader)
        .with_reader(FixedReader("export default 1\n"));
    let mocks = IndexMap::from([
        ("./a.js".to_string(), Value::from("a")),
        ("./b.js".to_string(), Value::from("b")),
    ]);

    mocker
        .build_mocked_identity(
            "/srv/app/main.js",
            "./service.js",
            &mocks,
            &IndexMap::new(),
            &MockOptions::default(),
        )
        .await
        .unwrap();

    // a's load fully completed before b's began
    assert_eq!(
        *log.lock(),
        [
            "start:/srv/app/a.js",
            "end:/srv/app/a.js",
            "start:/srv/app/b.js",
            "end:/srv/app/b.js",
        ]
    );
}

#[tokio::test]
async fn test_tolerated_not_found_registers_a_placeholder() {
    let resolver = TableResolver::with(&[("./service.js", "/srv/app/service.js")]);

    let mocker = ModuleMocker::new(resolver, UnreachableLoader)
        .with_reader(FixedReader("export default 1\n"));
    let options = MockOptions {
        is_module_not_found_error: false,
        ..MockOptions::default()
    };
    let mocks = IndexMap::from([("missing".to_string(), Value::from("stub"))]);

    let identity = mocker
        .build_mocked_identity("/srv/app/main.js", "./service.js", &mocks, &IndexMap::new(), &options)
        .await
        .unwrap();

    assert!(identity.starts_with("/srv/app/service.js?esmk="));
    let key = mocker.cache().mock_keys().pop().unwrap();
    assert!(key.starts_with("file:///missing?"));
    assert!(key.contains("&notfound=missing&"));
    assert!(key.contains("isesm=false"));
}

#[tokio::test]
async fn test_default_not_found_fails_before_later_entries() {
    let resolver = TableResolver::with(&[
        ("./service.js", "/srv/app/service.js"),
        ("./a.js", "/srv/app/a.js"),
        ("./b.js", "/srv/app/b.js"),
    ]);
    let loader = StaticLoader::new();
    loader.insert("/srv/app/a.js", ExportSet::new());
    loader.insert("/srv/app/b.js", ExportSet::new());

    let mocker = ModuleMocker::new(resolver, loader)
        .with_reader(FixedReader("export default 1\n"));
    let mocks = IndexMap::from([
        ("./a.js".to_string(), Value::from("a")),
        ("missing".to_string(), Value::from("m")),
        ("./b.js".to_string(), Value::from("b")),
    ]);

    let error = mocker
        .build_mocked_identity(
            "/srv/app/main.js",
            "./service.js",
            &mocks,
            &IndexMap::new(),
            &MockOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(error, MockError::ModuleNotFound { .. }));
    assert!(error.to_string().contains("missing"));
    // Only the entry before the failure was written
    assert_eq!(mocker.cache().mock_count(), 1);
    assert!(mocker.cache().mock_keys()[0].contains("a.js"));
}

#[tokio::test]
async fn test_unresolvable_target_always_fails() {
    let resolver = TableResolver::default();
    let mocker = ModuleMocker::new(resolver, UnreachableLoader);
    let options = MockOptions {
        is_module_not_found_error: false,
        ..MockOptions::default()
    };

    let error = mocker
        .build_mocked_identity(
            "/srv/app/main.js",
            "./service.js",
            &IndexMap::new(),
            &IndexMap::new(),
            &options,
        )
        .await
        .unwrap_err();
    assert!(matches!(error, MockError::ModuleNotFound { .. }));
}

#[tokio::test]
async fn test_globals_register_before_and_apart_from_direct_mocks() {
    let resolver = TableResolver::with(&[
        ("./service.js", "/srv/app/service.js"),
        ("./db.js", "/srv/app/db.js"),
        ("fs", "fs"),
    ]);
    let loader = StaticLoader::new();
    loader.insert("/srv/app/db.js", ExportSet::new());
    loader.insert("fs", ExportSet::new());

    let mocker = ModuleMocker::new(resolver, loader)
        .with_reader(FixedReader("export default 1\n"));
    let direct = IndexMap::from([("./db.js".to_string(), Value::from("db"))]);
    let globals = IndexMap::from([(
        "fs".to_string(),
        Value::Object(
            [("readFileSync", Value::function("readFileSync", |_| Value::from("text")))]
                .into_iter()
                .collect(),
        ),
    )]);

    let identity = mocker
        .build_mocked_identity(
            "/srv/app/main.js",
            "./service.js",
            &direct,
            &globals,
            &MockOptions::default(),
        )
        .await
        .unwrap();

    let session = spacey_mock::session_id_of(&identity).unwrap();
    let record = SessionRecord::decode(&mocker.cache().get_session(session).unwrap()).unwrap();
    assert_eq!(record.global_keys.len(), 1);
    assert_eq!(record.module_keys.len(), 1);

    // Globals registered first: their dependency index precedes the
    // direct mock's, and a core-module location is never ESM
    assert!(record.global_keys[0].contains("esmockModuleKey=0:fs"));
    assert!(record.global_keys[0].contains("isesm=false"));
    assert!(record.module_keys[0].contains("esmockModuleKey=1:./db.js"));

    mocker.purge(&identity);
    assert_eq!(mocker.cache().live_mock_count(), 0);
}
