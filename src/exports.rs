// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Export sets: a module's named outputs plus its default value.
//!
//! The default export is a distinguished slot, kept separate from the
//! named entries because import syntax treats it as the whole-module
//! value. Named entries preserve insertion order.

use crate::value::{ObjectValue, Value};
use indexmap::IndexMap;

/// A module's exports: ordered named entries and an optional default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSet {
    named: IndexMap<String, Value>,
    default: Option<Value>,
}

impl ExportSet {
    /// Create an empty export set
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an exported value; `"default"` addresses the default slot
    pub fn get(&self, name: &str) -> Option<&Value> {
        if name == "default" {
            self.default.as_ref()
        } else {
            self.named.get(name)
        }
    }

    /// Set an exported value; `"default"` is routed to the default slot
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if name == "default" {
            self.default = Some(value);
        } else {
            self.named.insert(name, value);
        }
    }

    /// The default export, if any
    pub fn default_export(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Replace the default export
    pub fn set_default(&mut self, value: Value) {
        self.default = Some(value);
    }

    /// Whether a default export is present
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// All export names, sorted, with `"default"` included when present
    pub fn export_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.named.keys().cloned().collect();
        if self.default.is_some() {
            names.push("default".to_string());
        }
        names.sort();
        names
    }

    /// Iterate named exports in insertion order (default excluded)
    pub fn iter_named(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.named.iter()
    }

    /// Number of exports, counting the default slot when present
    pub fn len(&self) -> usize {
        self.named.len() + usize::from(self.default.is_some())
    }

    /// Check if the set has no exports at all
    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.default.is_none()
    }

    /// Build an export set from an object, splitting out its `default`
    pub fn from_object(object: &ObjectValue) -> Self {
        let mut exports = ExportSet::new();
        for (name, value) in object.iter() {
            exports.insert(name.clone(), value.clone());
        }
        exports
    }

    /// Flatten to an object with the default as a `default` property
    pub fn to_object(&self) -> ObjectValue {
        let mut object = ObjectValue::new();
        for (name, value) in self.named.iter() {
            object.insert(name.clone(), value.clone());
        }
        if let Some(default) = &self.default {
            object.insert("default", default.clone());
        }
        object
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ExportSet {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut exports = ExportSet::new();
        for (name, value) in iter {
            exports.insert(name, value);
        }
        exports
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_a_distinct_slot() {
        let mut exports = ExportSet::new();
        exports.insert("default", Value::from("d"));
        exports.insert("query", Value::from("q"));

        assert_eq!(exports.iter_named().count(), 1);
        assert_eq!(exports.default_export(), Some(&Value::from("d")));
        assert_eq!(exports.get("default"), Some(&Value::from("d")));
        assert_eq!(exports.len(), 2);
    }

    #[test]
    fn test_export_names_sorted_with_default() {
        let exports: ExportSet = [
            ("query", Value::Undefined),
            ("default", Value::Undefined),
            ("connect", Value::Undefined),
        ]
        .into_iter()
        .collect();
        assert_eq!(exports.export_names(), ["connect", "default", "query"]);
    }

    #[test]
    fn test_object_round_trip() {
        let object: ObjectValue = [
            ("connect", Value::from(true)),
            ("default", Value::from(1.0)),
        ]
        .into_iter()
        .collect();
        let exports = ExportSet::from_object(&object);
        assert_eq!(exports.default_export(), Some(&Value::from(1.0)));
        assert_eq!(exports.to_object().get("connect"), Some(&Value::from(true)));
    }
}
