// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The per-invocation input to the authorizer.

use std::collections::HashMap;

use axum::http::HeaderMap;

/// Headers and the resource a decision is sought for.
///
/// Header names are stored lower-cased so lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct RawRequest {
    headers: HashMap<String, String>,
    resource: String,
}

impl RawRequest {
    /// Build from a header mapping as delivered by the gateway.
    ///
    /// Duplicate names (differing only by case) are joined; `cookie` values
    /// are joined with `"; "` so that split cookie headers parse as one list.
    pub fn new<I, K, V>(resource: impl Into<String>, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map: HashMap<String, String> = HashMap::new();
        for (name, value) in headers {
            let name = name.as_ref().to_ascii_lowercase();
            let value = value.into();
            match map.get_mut(&name) {
                Some(existing) => {
                    let sep = if name == "cookie" { "; " } else { ", " };
                    existing.push_str(sep);
                    existing.push_str(&value);
                }
                None => {
                    map.insert(name, value);
                }
            }
        }

        Self {
            headers: map,
            resource: resource.into(),
        }
    }

    /// Build from an in-process HTTP request's headers. Values that are not
    /// visible ASCII are dropped.
    pub fn from_header_map(resource: impl Into<String>, headers: &HeaderMap) -> Self {
        Self::new(
            resource,
            headers
                .iter()
                .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?.to_string()))),
        )
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}
