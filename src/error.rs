// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the mocking pipeline

use thiserror::Error;

/// Result type for mocking operations
pub type Result<T> = std::result::Result<T, MockError>;

/// Errors that can occur while registering or purging mocked modules
#[derive(Debug, Error)]
pub enum MockError {
    /// A specifier (or the target module id) could not be resolved
    #[error("invalid module id: \"{specifier}\" (imported by {parent})")]
    ModuleNotFound {
        /// The unresolvable specifier
        specifier: String,
        /// The parent location it was resolved against
        parent: String,
    },

    /// The dynamic loader could not evaluate a module
    #[error("failed to load module {location}: {reason}")]
    Load {
        /// Resolved location of the failing module
        location: String,
        /// Reason reported by the loader
        reason: String,
    },

    /// A file read failed in the ESM detector
    #[error("file read error: {0}")]
    Read(#[from] std::io::Error),
}

impl MockError {
    /// Create a module-not-found error for a specifier and its parent.
    ///
    /// The working directory and home directory are elided from both
    /// fields so the message stays portable across machines.
    pub fn module_not_found(specifier: impl Into<String>, parent: impl Into<String>) -> Self {
        Self::ModuleNotFound {
            specifier: elide_local_paths(specifier.into()),
            parent: elide_local_paths(parent.into()),
        }
    }

    /// Create a load error for a resolved location
    pub fn load(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Load {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

/// Replace the working directory with `.` and the home directory with `~`
fn elide_local_paths(mut text: String) -> String {
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(cwd) = cwd.to_str() {
            text = text.replace(cwd, ".");
        }
    }
    if let Some(home) = dirs::home_dir() {
        if let Some(home) = home.to_str() {
            text = text.replace(home, "~");
        }
    }
    text
}
