// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Identity generation.

use uuid::Uuid;

/// Random (v4) UUID in hyphenated lower-case form.
pub fn random_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Name-derived (v3, DNS namespace) UUID; identical input gives the same id.
pub fn derived_uuid(name: &str) -> String {
    Uuid::new_v3(&Uuid::NAMESPACE_DNS, name.as_bytes()).to_string()
}

/// True if `s` is a 36-character hyphenated UUID.
pub fn is_uuid(s: &str) -> bool {
    s.len() == 36 && Uuid::try_parse(s).is_ok()
}
