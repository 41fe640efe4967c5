// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! ESM format detection
//!
//! Decides whether a resolved location refers to an ECMAScript-module
//! file. Results are memoized per location in the [`MockCache`]: the
//! miss path reads the file, so a location must never be read twice.

use crate::error::Result;
use crate::mock_system::cache::MockCache;
use crate::mock_system::loader::SourceReader;
use crate::mock_system::resolver::Resolver;

/// Recognizes import/export syntax at statement boundaries: start of
/// text, or after a closing brace, closing paren, semicolon or newline.
const ESM_SYNTAX_PATTERN: &str = r#"(^\s*|[});\n]\s*)(import\s+(['"]|(\*\s+as\s+)?[^"'()\n;]+\s+from\s+['"]|\{)|export\s+\*\s+from\s+["']|export\s+(\{|default|function|class|var|const|let|async\s+function))"#;

/// Matches locations that are syntactically filesystem paths: an
/// optional `.` or `..`, an optional drive letter, then a separator.
const PATH_SHAPE_PATTERN: &str = r"^\.?\.?([a-zA-Z]:)?(/|\\)";

/// Whether the file at `location` is in ESM format.
///
/// Core modules and locations that are not filesystem paths are never
/// ESM. Everything else is decided by reading the file once and testing
/// the syntax heuristic; a read failure is fatal, since resolution
/// already implied the file exists. Returns memoized results when
/// available.
pub fn is_module_esm(
    cache: &MockCache,
    resolver: &dyn Resolver,
    reader: &dyn SourceReader,
    location: &str,
) -> Result<bool> {
    if let Some(memoized) = cache.esm_get(location) {
        return Ok(memoized);
    }

    let is_esm = if resolver.is_core_module(location) || !is_path_shaped(location) {
        false
    } else {
        let source = reader.read_text(location)?;
        regex::Regex::new(ESM_SYNTAX_PATTERN)
            .unwrap()
            .is_match(&source)
    };

    cache.esm_set(location, is_esm);
    Ok(is_esm)
}

fn is_path_shaped(location: &str) -> bool {
    regex::Regex::new(PATH_SHAPE_PATTERN)
        .unwrap()
        .is_match(location)
}
