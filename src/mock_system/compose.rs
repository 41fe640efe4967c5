// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Export composition
//!
//! Merges a module's live (really loaded) export set with a
//! caller-supplied mock definition. Composition is not commutative: the
//! mock wins, except that two object defaults are shallow-merged
//! field by field. All outputs are freshly constructed; no input value
//! is mutated.

use crate::exports::ExportSet;
use crate::value::{ObjectValue, Value};

/// Compose live exports with a mock definition.
///
/// A mock object carrying a `default` property contributes that
/// property as the default candidate and its remaining properties as
/// named overrides; a mock object without one contributes itself as the
/// default candidate and its properties as named overrides; any other
/// mock value is the default candidate alone. Named mock entries
/// replace same-named live exports; live-only exports pass through
/// unchanged. `is_core` suppresses the interop shim for runtime-
/// supplied modules.
pub fn compose_exports(live: Option<&ExportSet>, mock: &Value, is_core: bool) -> ExportSet {
    let mut composed = live.cloned().unwrap_or_default();

    let default_candidate = match mock.as_object() {
        Some(object) => object.get("default").cloned().unwrap_or_else(|| mock.clone()),
        None => mock.clone(),
    };
    let merged = merge_default(composed.default_export(), &default_candidate);

    if let Some(object) = mock.as_object() {
        for (name, value) in object.iter() {
            if name != "default" {
                composed.insert(name.clone(), value.clone());
            }
        }
    }

    composed.set_default(apply_interop_shim(merged, is_core));
    composed
}

/// Shallow-merge two object defaults; otherwise the mock wins outright
fn merge_default(live: Option<&Value>, mock: &Value) -> Value {
    match (live, mock) {
        (Some(Value::Object(live)), Value::Object(mock)) => {
            let mut merged = live.clone();
            merged.assign(mock);
            Value::Object(merged)
        }
        _ => mock.clone(),
    }
}

/// Attach a `default.default` self-reference for compatibility with
/// transpiler-generated cjs files that define one.
///
/// The shim is built immutably: the result is a fresh object carrying
/// the default's fields plus a `default` field holding a copy of the
/// pre-shim object. Sealed objects and non-objects pass through.
fn apply_interop_shim(default: Value, is_core: bool) -> Value {
    if is_core {
        return default;
    }
    match default {
        Value::Object(object) if object.is_extensible() => {
            let mut shimmed = object.clone();
            shimmed.insert("default", Value::Object(object));
            Value::Object(shimmed)
        }
        other => other,
    }
}

/// Flatten a composed namespace so the caller receives the default
/// value directly, without an extra `.default` hop.
///
/// A primitive default (boolean, number or string) cannot carry named
/// exports, so the namespace is returned as-is in object form. For any
/// other default, a fresh object is built from the default's fields,
/// overlaid with the namespace's entries, plus an `esmockKey` field
/// carrying the session id.
pub fn sanitize(imported: &ExportSet, esmock_key: u64) -> Value {
    if imported.default_export().is_some_and(Value::is_primitive) {
        return Value::Object(imported.to_object());
    }

    let mut flat = ObjectValue::new();
    if let Some(Value::Object(default)) = imported.default_export() {
        flat.assign(default);
    }
    flat.assign(&imported.to_object());
    flat.insert("esmockKey", Value::Number(esmock_key as f64));
    Value::Object(flat)
}
