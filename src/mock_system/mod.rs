// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The mock-registration and resolution pipeline
//!
//! ## Registration
//! - [`ModuleMocker::build_mocked_identity`] — one call per
//!   mocked-import request
//! - [`compose_exports`] — live + mock export merging
//! - [`is_module_esm`] — memoized format detection
//!
//! ## Invalidation
//! - [`ModuleMocker::purge`] — clears everything a session created
//!
//! ## Seams
//! - [`Resolver`] / [`NodeResolver`]
//! - [`DynamicLoader`] / [`StaticLoader`]
//! - [`SourceReader`] / [`FsReader`]

mod builder;
mod cache;
mod compose;
mod detect;
mod key;
mod loader;
mod registrar;
mod resolver;

pub use builder::{MockOptions, ModuleMocker};
pub use cache::MockCache;
pub use compose::{compose_exports, sanitize};
pub use detect::is_module_esm;
pub use key::{
    rewritten_identifier, session_id_of, DepId, SessionRecord, SyntheticKey, EMPTY_KEYS,
    KEY_DELIMITER,
};
pub use loader::{DynamicLoader, FsReader, SourceReader, StaticLoader};
pub use resolver::{NodeResolver, Resolver, CORE_MODULES};
