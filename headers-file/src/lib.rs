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

//! # Headers File
//!
//! This crate parses `_headers` files as known from static hosting platforms and determines the
//! HTTP response headers applying to a particular request. Site authors use these files to
//! declare headers per path or per host without any server-side code.
//!
//! A headers file could look like this:
//!
//! ```text
//! # This is a comment
//! /secure/page
//!   X-Frame-Options: DENY
//!   X-Content-Type-Options: nosniff
//!
//! /static/*
//!   Access-Control-Allow-Origin: *
//!   X-Robots-Tag: nosnippet
//!
//! https://myproject.pages.dev/*
//!   X-Robots-Tag: noindex
//!
//! /*.jpg
//!   ! Content-Security-Policy
//! ```
//!
//! Each rule starts with a pattern line, followed by indented header lines. A header line is
//! either `Name: value` or `! Name`, the latter removing a header added by a preceding rule.
//! Blank lines and lines starting with `#` are ignored.
//!
//! ## Patterns
//!
//! * `/path`: This rule applies to the specified path on all hosts.
//! * `/path/*`: A splat matches any characters apart from `/`, here any file in the `/path`
//!   directory but not its subdirectories. Header values can refer to the matched text as
//!   `:splat`.
//! * `/movies/:title`: A named placeholder matches like a splat. Header values can refer to the
//!   matched text as `:title`.
//! * `https://host/path`: This rule applies to all requests to the host, regardless of the path.
//!   The host can contain a splat or a placeholder as well, these match any characters apart from
//!   `.` here. Only the `https` scheme is accepted and a port cannot be specified.
//!
//! Scheme and port of the request are never considered when matching.
//!
//! ## Rule order
//!
//! An incoming request matching multiple rules inherits all rules’ headers. If several rules
//! define the same header, the values are joined with a comma in the order of declaration. A
//! `! Name` line only removes values added by rules declared before it, later rules can add the
//! header again.
//!
//! ## Code example
//!
//! ```rust
//! use headers_file::parse_str;
//! use url::Url;
//!
//! let file = parse_str(r#"
//! /movies/:title
//!   x-movie-name: You are watching ":title"
//! "#).unwrap();
//!
//! let url = Url::parse("https://example.com/movies/star-wars").unwrap();
//! assert_eq!(
//!     file.match_url(&url),
//!     vec![r#"x-movie-name: You are watching "star-wars""#]
//! );
//! ```

pub mod configuration;
mod error;
mod file;
mod parser;
pub mod pattern;
mod processing;

pub use configuration::Limits;
pub use error::ParseError;
pub use file::{File, Header, Rule};
pub use parser::{parse, parse_str, parse_with_limits};
pub use pattern::Pattern;
pub use processing::flatten;

#[cfg(test)]
mod tests;
