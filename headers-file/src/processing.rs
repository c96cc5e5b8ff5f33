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

use crate::file::Header;
use crate::pattern::Match;

/// Headers collected from all rules matching a request, in rule order
///
/// Detach entries are kept as they are, these are only resolved by [`HeaderStack::flatten`].
#[derive(Debug, Default)]
pub(crate) struct HeaderStack {
    entries: Vec<Header>,
}

impl HeaderStack {
    /// Adds the headers of a matching rule, substituting the captured value into header values.
    pub(crate) fn push_rule(&mut self, headers: &[Header], match_: Match<'_>) {
        match match_ {
            Match::Exact => self.entries.extend_from_slice(headers),
            Match::Captured { token, value } => self
                .entries
                .extend(headers.iter().map(|header| header.substituted(token, value))),
        }
    }

    /// Resolves detach entries and combines values of identically named headers.
    pub(crate) fn flatten(&self) -> Vec<(String, String)> {
        merge_headers(&self.entries)
    }
}

/// Combines a list of headers into name/value pairs.
///
/// A detach entry drops all values collected for that name so far. Multiple values of the same
/// header are joined with a comma. The result is ordered by first appearance of each name.
pub(crate) fn merge_headers(headers: &[Header]) -> Vec<(String, String)> {
    let mut merged: Vec<(&str, Vec<&str>)> = Vec::new();
    for header in headers {
        let existing = merged.iter().position(|(name, _)| *name == header.name);
        if header.detach {
            if let Some(existing) = existing {
                merged.remove(existing);
            }
        } else if let Some(existing) = existing {
            merged[existing].1.push(header.value.as_str());
        } else {
            merged.push((header.name.as_str(), vec![header.value.as_str()]));
        }
    }

    merged
        .into_iter()
        .map(|(name, values)| (name.to_owned(), values.join(",")))
        .collect()
}

/// Converts a list of headers into header lines like `Name: value`.
///
/// Headers are processed in order. A detach entry (see [`Header::detach`]) removes the values
/// collected for the same header name so far, later entries can add the header again. Multiple
/// values of a header are joined with a comma and no space. Names are compared case-sensitively.
pub fn flatten(headers: &[Header]) -> Vec<String> {
    merge_headers(headers)
        .into_iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect()
}
