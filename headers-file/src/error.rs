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

//! Errors produced while parsing a headers file

/// Reasons for rejecting a headers file
///
/// Line numbers are 1-based and count every line of the input, including blank lines and
/// comments.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A header directive could not be processed, either because no pattern line precedes it or
    /// because it lacks the colon separating name and value.
    #[error("line {line}: {reason}: {content:?}")]
    MalformedHeaderLine {
        /// Line number
        line: usize,
        /// The complete line as found in the input
        content: String,
        /// Description of the problem
        reason: &'static str,
    },

    /// An absolute URL pattern specifies a port.
    #[error("line {line}: invalid port in rule: {pattern:?}")]
    InvalidPort {
        /// Line number
        line: usize,
        /// The pattern line
        pattern: String,
    },

    /// A pattern specifies a scheme other than `https`.
    #[error("line {line}: invalid scheme: {scheme:?}")]
    InvalidScheme {
        /// Line number
        line: usize,
        /// The scheme found in the pattern
        scheme: String,
    },

    /// A pattern line is not a valid URL reference.
    #[error("line {line}: malformed pattern {pattern:?}")]
    MalformedPatternLine {
        /// Line number
        line: usize,
        /// The pattern line
        pattern: String,
        /// Error reported by the URL parser
        #[source]
        source: url::ParseError,
    },

    /// A line exceeds the configured maximum line length.
    #[error("line {line}: line exceeds {limit} characters")]
    LineTooLong {
        /// Line number
        line: usize,
        /// Configured limit
        limit: usize,
    },

    /// The file contains more rules than configured.
    #[error("more than {limit} rules defined")]
    TooManyRules {
        /// Configured limit
        limit: usize,
    },

    /// Reading the input failed.
    #[error("failed reading headers file: {0}")]
    InputReadFailure(#[from] std::io::Error),
}

impl ParseError {
    /// Returns `true` if parsing failed due to an I/O error rather than invalid file contents.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::InputReadFailure(_))
    }

    /// Returns the number of the line that caused the error if known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MalformedHeaderLine { line, .. }
            | Self::InvalidPort { line, .. }
            | Self::InvalidScheme { line, .. }
            | Self::MalformedPatternLine { line, .. }
            | Self::LineTooLong { line, .. } => Some(*line),
            Self::TooManyRules { .. } | Self::InputReadFailure(_) => None,
        }
    }
}
