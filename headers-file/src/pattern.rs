// Copyright 2024 Wladimir Palant
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Implements matching of host names and paths against rule patterns.
//!
//! A pattern fragment (either the host name or the path of a rule) can contain a single splat
//! (`*`) or a single named placeholder (`:name`). Both match any run of characters apart from the
//! delimiter: `.` within host names and `/` within paths. So `/movies/:title` matches
//! `/movies/star-wars` but not `/movies/star-wars/episode-1`, and `:subdomain.example.com`
//! matches `sub.example.com` but not `sub.dub.example.com`.
//!
//! A placeholder name has to start with an ASCII letter, followed by any number of ASCII letters,
//! digits and underscores. Anything else after a colon, e.g. `:1page`, is taken literally.

use serde::Serialize;

/// The token standing for the value captured by a splat when substituting into header values
pub const SPLAT_TOKEN: &str = ":splat";

/// Distinguishes the two kinds of pattern fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    /// Host name, captures cannot contain `.`
    Host,
    /// URL path, captures cannot contain `/`
    Path,
}

impl Fragment {
    /// The character a capture within this fragment is not allowed to contain
    pub fn delimiter(self) -> char {
        match self {
            Self::Host => '.',
            Self::Path => '/',
        }
    }
}

/// Result of a successful match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match<'a> {
    /// The input is identical to the pattern
    Exact,
    /// The pattern contained a splat or a placeholder
    Captured {
        /// The token to be replaced in header values: `:splat` or the placeholder like `:title`
        token: &'a str,
        /// The part of the input matched by the splat or placeholder
        value: &'a str,
    },
}

/// A parsed rule pattern
///
/// Patterns with a host only ever match against the host name of a request, path patterns only
/// against the path. Scheme and port of the request are never considered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pattern {
    /// Scheme of absolute URL patterns, always `https` if present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Host name in lowercase and punycode form, any splat or placeholder kept as written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Normalized and percent-decoded path
    pub path: String,
    /// Path as written in the pattern line
    pub raw_path: String,
}

impl Pattern {
    /// Creates a pattern matching request paths on any host.
    pub fn path(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            scheme: None,
            host: None,
            raw_path: path.clone(),
            path,
        }
    }

    /// Creates a pattern matching all requests to the given host, as parsed from
    /// `https://{host}{path}`.
    ///
    /// The host is expected in normalized form: lowercase, with internationalized labels in
    /// punycode. The path is only informational, host patterns never look at request paths.
    pub fn host(host: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            scheme: Some("https".to_owned()),
            host: Some(host.into()),
            raw_path: path.clone(),
            path,
        }
    }

    /// Returns `true` if this pattern matches on the host name rather than the path.
    pub fn is_host_pattern(&self) -> bool {
        self.host.is_some()
    }

    /// Matches the pattern against host name and path of a request.
    ///
    /// `host` is expected without port, `path` percent-decoded.
    pub fn matches<'a>(&'a self, host: &'a str, path: &'a str) -> Option<Match<'a>> {
        if let Some(pattern) = &self.host {
            match_fragment(pattern, host, Fragment::Host)
        } else {
            match_fragment(&self.path, path, Fragment::Path)
        }
    }
}

/// Matches an input string against a pattern fragment.
///
/// A splat is tried first, then a named placeholder and finally an exact comparison.
pub fn match_fragment<'a>(
    pattern: &'a str,
    input: &'a str,
    fragment: Fragment,
) -> Option<Match<'a>> {
    if let Some(start) = pattern.find('*') {
        if let Some(value) = capture(pattern, start, start + 1, input, fragment) {
            return Some(Match::Captured {
                token: SPLAT_TOKEN,
                value,
            });
        }
    }

    if let Some((start, end)) = find_placeholder(pattern) {
        if let Some(value) = capture(pattern, start, end, input, fragment) {
            return Some(Match::Captured {
                token: &pattern[start..end],
                value,
            });
        }
    }

    if pattern == input {
        Some(Match::Exact)
    } else {
        None
    }
}

/// Locates the first placeholder token in the pattern, returns its start and end position.
pub(crate) fn find_placeholder(pattern: &str) -> Option<(usize, usize)> {
    let bytes = pattern.as_bytes();
    let mut search = 0;
    while let Some(offset) = pattern[search..].find(':') {
        let start = search + offset;
        if bytes.get(start + 1).is_some_and(u8::is_ascii_alphabetic) {
            let len = bytes[start + 1..]
                .iter()
                .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
                .count();
            return Some((start, start + 1 + len));
        }
        search = start + 1;
    }
    None
}

/// Matches the input against the text around `pattern[start..end]` and returns the part of the
/// input in between.
fn capture<'a>(
    pattern: &str,
    start: usize,
    end: usize,
    input: &'a str,
    fragment: Fragment,
) -> Option<&'a str> {
    let prefix = &pattern[..start];
    let suffix = &pattern[end..];

    if !input.starts_with(prefix) || !input.ends_with(suffix) {
        return None;
    }

    // Prefix and suffix may overlap in the input, the suffix is removed first
    let rest = &input[..input.len() - suffix.len()];
    let value = rest.strip_prefix(prefix).unwrap_or(rest);
    if value.contains(fragment.delimiter()) {
        None
    } else {
        Some(value)
    }
}
