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

//! Rule set data structures and request matching

use http::header::{HeaderMap, HeaderName, HeaderValue};
use log::{trace, warn};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::ops::Deref;
use std::str::FromStr;
use url::Url;

use crate::error::ParseError;
use crate::pattern::Pattern;
use crate::processing::HeaderStack;

/// A header directive within a rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Header name, exactly as written in the file
    pub name: String,
    /// Header value, ignored for detach directives
    pub value: String,
    /// If `true`, this header is to be removed rather than added
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub detach: bool,
}

impl Header {
    /// Creates a header to be added to responses.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            detach: false,
        }
    }

    /// Creates a directive removing a header added by previous rules.
    pub fn detach(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            detach: true,
        }
    }

    /// Replaces the first occurrence of `token` in the value.
    pub(crate) fn substituted(&self, token: &str, replacement: &str) -> Self {
        Self {
            name: self.name.clone(),
            value: self.value.replacen(token, replacement, 1),
            detach: self.detach,
        }
    }
}

/// A pattern and the headers applying to requests matching it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Rule {
    /// The pattern requests are matched against
    pub pattern: Pattern,
    /// Header directives in the order listed
    pub headers: Vec<Header>,
}

impl Rule {
    /// Creates a new rule.
    pub fn new(pattern: Pattern, headers: Vec<Header>) -> Self {
        Self { pattern, headers }
    }
}

/// A parsed headers file: the list of rules in the order of declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct File {
    rules: Vec<Rule>,
}

impl File {
    /// Creates a rule set from a list of rules, these will be evaluated in the given order.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Returns the rules of this file.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Consumes the file, returning its rules.
    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }

    /// Determines the headers applying to the given URL.
    ///
    /// Returns header lines like `Name: value`. Only host name and path of the URL are
    /// considered, scheme and port are ignored. See [`File::match_host_path`] for details.
    pub fn match_url(&self, url: &Url) -> Vec<String> {
        let path = percent_decode_str(url.path()).decode_utf8_lossy();
        self.match_host_path(hostname(url), &path)
    }

    /// Determines the headers applying to a request for the given host name (without port) and
    /// percent-decoded path.
    ///
    /// All rules are evaluated in order. Headers of every matching rule are collected, a
    /// placeholder or splat value captured by the rule’s pattern is substituted into the header
    /// values. The resulting list is then flattened, see [`crate::flatten`].
    ///
    /// The order of the resulting header lines is deterministic but callers shouldn’t rely on
    /// it.
    pub fn match_host_path(&self, host: &str, path: &str) -> Vec<String> {
        self.collect(host, path)
            .into_iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect()
    }

    /// Adds the headers applying to the given URL to a header map, replacing existing values.
    ///
    /// Headers that aren’t valid in HTTP responses are skipped.
    pub fn apply_to(&self, url: &Url, headers: &mut HeaderMap) {
        let path = percent_decode_str(url.path()).decode_utf8_lossy();
        for (name, value) in self.collect(hostname(url), &path) {
            let name = match HeaderName::from_bytes(name.as_bytes()) {
                Ok(name) => name,
                Err(err) => {
                    warn!("Skipping header with invalid name {name:?}: {err}");
                    continue;
                }
            };
            let value = match HeaderValue::from_str(&value) {
                Ok(value) => value,
                Err(err) => {
                    warn!("Skipping invalid value {value:?} for header {name}: {err}");
                    continue;
                }
            };
            headers.insert(name, value);
        }
    }

    fn collect(&self, host: &str, path: &str) -> Vec<(String, String)> {
        let mut stack = HeaderStack::default();
        for (index, rule) in self.rules.iter().enumerate() {
            if let Some(match_) = rule.pattern.matches(host, path) {
                trace!("Rule {index} matches host/path combination {host:?}{path}: {match_:?}");
                stack.push_rule(&rule.headers, match_);
            }
        }

        let result = stack.flatten();
        trace!("Headers for host/path combination {host:?}{path}: {result:?}");
        result
    }
}

/// Host name of the URL without port, IPv6 addresses without brackets
fn hostname(url: &Url) -> &str {
    let host = url.host_str().unwrap_or_default();
    host.strip_prefix('[')
        .and_then(|host| host.strip_suffix(']'))
        .unwrap_or(host)
}

impl Deref for File {
    type Target = [Rule];

    fn deref(&self) -> &Self::Target {
        &self.rules
    }
}

impl From<Vec<Rule>> for File {
    fn from(rules: Vec<Rule>) -> Self {
        Self::new(rules)
    }
}

impl FromIterator<Rule> for File {
    fn from_iter<T: IntoIterator<Item = Rule>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a File {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl FromStr for File {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::parse(s.as_bytes())
    }
}
