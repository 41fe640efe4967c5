// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # spacey-mock
//!
//! Import mocking for ESM module graphs: tests swap a target module's
//! dependencies for substitute implementations without touching the
//! target's source.
//!
//! Each mocked dependency is resolved to a concrete location, its real
//! exports are loaded and merged with the caller's mock values, and the
//! merged set is registered under a synthetic key. The builder returns
//! a rewritten module identifier carrying the session id; handing that
//! identifier to the host runtime's dynamic loader makes the target
//! observe the mocked exports. Purging the identifier invalidates
//! everything the session registered.
//!
//! - Resolution, loading and file reads are consumed through the
//!   [`Resolver`], [`DynamicLoader`] and [`SourceReader`] seams
//! - Registered mocks and session records live in an injectable
//!   [`MockCache`]
//! - Export values are engine-neutral [`Value`] data
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spacey_mock::{ModuleMocker, MockOptions, NodeResolver, Value};
//! use indexmap::IndexMap;
//!
//! #[tokio::main]
//! async fn main() -> spacey_mock::Result<()> {
//!     let mocker = ModuleMocker::new(NodeResolver::new(), runtime_loader());
//!
//!     let mut mocks = IndexMap::new();
//!     mocks.insert("./db.js".to_string(), Value::function("query", |_| "stub".into()));
//!
//!     let identity = mocker
//!         .build_mocked_identity("/srv/app/main.js", "./service.js",
//!             &mocks, &IndexMap::new(), &MockOptions::default())
//!         .await?;
//!     // hand `identity` to the runtime's dynamic loader ...
//!     mocker.purge(&identity);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod exports;
pub mod mock_system;
pub mod value;

// Re-exports
pub use error::{MockError, Result};
pub use exports::ExportSet;
pub use mock_system::{
    compose_exports, is_module_esm, rewritten_identifier, sanitize, session_id_of, DepId,
    DynamicLoader, FsReader, MockCache, MockOptions, ModuleMocker, NodeResolver, Resolver,
    SessionRecord, SourceReader, StaticLoader, SyntheticKey,
};
pub use value::{NativeFunction, ObjectValue, Value};

/// Version of the spacey-mock crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
