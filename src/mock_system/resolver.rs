// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Specifier resolution seam
//!
//! The pipeline consumes resolution through the [`Resolver`] trait;
//! [`NodeResolver`] is the stock implementation of the Node.js
//! algorithm (relative and absolute paths, extension probing, directory
//! index and `package.json` "main", node_modules walk, builtin list).

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Names of modules supplied by the runtime itself.
///
/// A core module never resolves to a filesystem path and is never
/// considered ESM by the detector.
pub const CORE_MODULES: &[&str] = &[
    "assert",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "https",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "worker_threads",
    "zlib",
];

/// Resolves dependency specifiers to concrete file locations.
pub trait Resolver: Send + Sync {
    /// Resolve a specifier against a parent location; `None` means the
    /// specifier matches no file
    fn resolve(&self, specifier: &str, parent: &str) -> Option<String>;

    /// Whether an id or location names a runtime-supplied module
    fn is_core_module(&self, id: &str) -> bool;
}

/// Node.js-style filesystem resolver.
pub struct NodeResolver {
    /// File extensions probed when the specifier has none
    extensions: Vec<&'static str>,
}

impl NodeResolver {
    /// Create a resolver probing `.js`, `.mjs`, `.cjs` and `.json`
    pub fn new() -> Self {
        Self {
            extensions: vec![".js", ".mjs", ".cjs", ".json"],
        }
    }

    /// Resolve a relative or absolute path specifier
    fn resolve_path(&self, specifier: &str, parent: &str) -> Option<PathBuf> {
        let parent_dir = Path::new(parent).parent().unwrap_or(Path::new("."));
        let path = parent_dir.join(specifier);

        if path.is_file() {
            return Some(path);
        }

        // Extensions are appended, never substituted, so "pkg.config"
        // probes "pkg.config.js" rather than "pkg.js"
        for ext in &self.extensions {
            let mut candidate = path.as_os_str().to_os_string();
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        if path.is_dir() {
            return self.resolve_directory(&path);
        }

        None
    }

    /// Resolve a directory through package.json "main" or an index file
    fn resolve_directory(&self, dir: &Path) -> Option<PathBuf> {
        let package_json = dir.join("package.json");
        if package_json.is_file() {
            if let Ok(content) = std::fs::read_to_string(&package_json) {
                if let Ok(package) = serde_json::from_str::<PackageJson>(&content) {
                    if let Some(main) = package.main {
                        let main_path = dir.join(&main);
                        if main_path.is_file() {
                            return Some(main_path);
                        }
                        for ext in &self.extensions {
                            let mut candidate = main_path.as_os_str().to_os_string();
                            candidate.push(ext);
                            let candidate = PathBuf::from(candidate);
                            if candidate.is_file() {
                                return Some(candidate);
                            }
                        }
                    }
                }
            }
        }

        for ext in &self.extensions {
            let index = dir.join(format!("index{ext}"));
            if index.is_file() {
                return Some(index);
            }
        }

        None
    }

    /// Resolve a bare specifier by walking up through node_modules
    fn resolve_node_modules(&self, specifier: &str, parent: &str) -> Option<PathBuf> {
        let (package_name, subpath) = parse_package_specifier(specifier);

        let mut current = Path::new(parent).parent();
        while let Some(dir) = current {
            let package_dir = dir.join("node_modules").join(package_name);
            if package_dir.exists() {
                match subpath {
                    Some(sub) => {
                        let full = package_dir.join(sub);
                        if full.is_file() {
                            return Some(full);
                        }
                        for ext in &self.extensions {
                            let mut candidate = full.as_os_str().to_os_string();
                            candidate.push(ext);
                            let candidate = PathBuf::from(candidate);
                            if candidate.is_file() {
                                return Some(candidate);
                            }
                        }
                        if full.is_dir() {
                            return self.resolve_directory(&full);
                        }
                    }
                    None => return self.resolve_directory(&package_dir),
                }
            }
            current = dir.parent();
        }

        None
    }
}

impl Resolver for NodeResolver {
    fn resolve(&self, specifier: &str, parent: &str) -> Option<String> {
        if self.is_core_module(specifier) {
            return Some(specifier.to_string());
        }

        let bare = specifier.strip_prefix("node:").unwrap_or(specifier);
        let resolved = if is_path_specifier(bare) {
            self.resolve_path(bare, parent)
        } else {
            self.resolve_node_modules(bare, parent)
        }?;

        let resolved = resolved.canonicalize().unwrap_or(resolved);
        Some(resolved.to_string_lossy().into_owned())
    }

    fn is_core_module(&self, id: &str) -> bool {
        let id = id.strip_prefix("node:").unwrap_or(id);
        CORE_MODULES.contains(&id)
    }
}

impl Default for NodeResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a specifier names a path rather than a package
fn is_path_specifier(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
        || specifier.starts_with('\\')
        || (cfg!(windows) && specifier.chars().nth(1) == Some(':'))
}

/// Split a package specifier into name and optional subpath
fn parse_package_specifier(specifier: &str) -> (&str, Option<&str>) {
    if let Some(rest) = specifier.strip_prefix('@') {
        // Scoped package: @scope/name or @scope/name/subpath
        if let Some(slash) = rest.find('/') {
            let after_name = &rest[slash + 1..];
            if let Some(subpath_slash) = after_name.find('/') {
                let name_end = 1 + slash + 1 + subpath_slash;
                return (&specifier[..name_end], Some(&specifier[name_end + 1..]));
            }
        }
        (specifier, None)
    } else {
        match specifier.split_once('/') {
            Some((name, subpath)) => (name, Some(subpath)),
            None => (specifier, None),
        }
    }
}

/// Minimal package.json structure for resolution
#[derive(Debug, Deserialize)]
struct PackageJson {
    main: Option<String>,
}
