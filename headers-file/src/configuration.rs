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

//! Structures required to deserialize parser configuration from YAML configuration files.

use serde::Deserialize;

/// Restrictions applied to headers files during parsing
///
/// No restrictions apply by default. A configuration file could look like this:
///
/// ```yaml
/// max_rules: 100
/// max_line_length: 2000
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    /// Maximal number of rules in a file
    pub max_rules: Option<usize>,
    /// Maximal number of characters in a line, including indentation
    pub max_line_length: Option<usize>,
}

impl Limits {
    /// No restrictions
    pub const UNLIMITED: Limits = Limits {
        max_rules: None,
        max_line_length: None,
    };

    /// The restrictions enforced by the static hosting platform: 100 rules, 2000 characters per
    /// line
    pub const PAGES: Limits = Limits {
        max_rules: Some(100),
        max_line_length: Some(2000),
    };

    /// Overrides settings with the ones present in `other`.
    pub fn merge_with(&mut self, other: &Limits) {
        if other.max_rules.is_some() {
            self.max_rules = other.max_rules;
        }
        if other.max_line_length.is_some() {
            self.max_line_length = other.max_line_length;
        }
    }

    pub(crate) fn exceeds_rules(&self, count: usize) -> Option<usize> {
        self.max_rules.filter(|limit| count > *limit)
    }

    pub(crate) fn exceeds_line_length(&self, line: &str) -> Option<usize> {
        self.max_line_length
            .filter(|limit| line.len() > *limit && line.chars().count() > *limit)
    }
}
