// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential extraction from the `cookie` header.
//!
//! Parsing never fails as a whole: a pair that cannot be understood is
//! skipped, so one stray cookie set by a browser extension or proxy cannot
//! lock a user out.

use std::collections::HashMap;

use super::request::RawRequest;

/// Cookie name to value. On duplicate names the last occurrence wins.
pub type CookieMap = HashMap<String, String>;

/// Parse a `cookie` header value (`name=value; name2=value2`).
///
/// Values are percent-decoded and may be wrapped in double quotes.
pub fn parse_cookies(header: &str) -> CookieMap {
    let mut cookies = CookieMap::new();

    for pair in header.split(';') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);

        // Invalid percent-encoding or non-UTF-8 after decoding: skip the pair.
        let Ok(decoded) = urlencoding::decode(value) else {
            continue;
        };

        cookies.insert(name.to_string(), decoded.into_owned());
    }

    cookies
}

/// Parse the request's cookies, or `None` if there is no usable `cookie` header.
pub fn request_cookies(request: &RawRequest) -> Option<CookieMap> {
    let header = request.header("cookie")?;
    if header.trim().is_empty() {
        return None;
    }
    Some(parse_cookies(header))
}

/// Pull the credential out of the named cookie.
///
/// `None` is the normal outcome for unauthenticated traffic, not an error.
pub fn extract_credential(request: &RawRequest, cookie_name: &str) -> Option<String> {
    request_cookies(request)?
        .remove(cookie_name)
        .filter(|v| !v.is_empty())
}
