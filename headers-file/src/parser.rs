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

//! Parsing of headers files into rule sets

use log::{debug, trace};
use percent_encoding::percent_decode_str;
use std::io::BufRead;
use url::{Host, Url};

use crate::configuration::Limits;
use crate::error::ParseError;
use crate::file::{File, Header, Rule};
use crate::pattern::{find_placeholder, Pattern};

/// Base URL used to resolve path-only patterns
const RELATIVE_BASE: &str = "https://relative.invalid/";

/// Stands in for the host while the URL parser processes absolute patterns. Hosts containing
/// splats or placeholders wouldn’t survive the URL parser unchanged.
const HOST_PLACEHOLDER: &str = "placeholder.invalid";

/// Parses a headers file without any limits applied.
pub fn parse(reader: impl BufRead) -> Result<File, ParseError> {
    parse_with_limits(reader, &Limits::UNLIMITED)
}

/// Parses headers file contents from a string.
pub fn parse_str(text: &str) -> Result<File, ParseError> {
    parse(text.as_bytes())
}

/// Parses a headers file, rejecting it if it exceeds the given limits.
///
/// Parsing stops at the first error, no partial results are returned.
pub fn parse_with_limits(reader: impl BufRead, limits: &Limits) -> Result<File, ParseError> {
    let mut rules = Vec::new();
    let mut accumulator = Accumulator::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let text = if index == 0 {
            line.trim_start_matches('\u{feff}')
        } else {
            line.as_str()
        };
        let number = index + 1;

        if let Some(limit) = limits.exceeds_line_length(text) {
            return Err(ParseError::LineTooLong {
                line: number,
                limit,
            });
        }

        if let Some(rule) = accumulator.feed(number, text)? {
            push_rule(&mut rules, rule, limits)?;
        }
    }

    if let Some(rule) = accumulator.finish() {
        push_rule(&mut rules, rule, limits)?;
    }

    debug!("Parsed headers file with {} rules", rules.len());
    Ok(File::new(rules))
}

fn push_rule(rules: &mut Vec<Rule>, rule: Rule, limits: &Limits) -> Result<(), ParseError> {
    if let Some(limit) = limits.exceeds_rules(rules.len() + 1) {
        return Err(ParseError::TooManyRules { limit });
    }

    trace!("Completed rule: {rule:?}");
    rules.push(rule);
    Ok(())
}

/// Kinds of input lines
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    /// Blank line or comment
    Ignored,
    /// Indented line, trimmed
    Header(&'a str),
    /// Anything else, trimmed
    Pattern(&'a str),
}

impl<'a> From<&'a str> for Line<'a> {
    fn from(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            Self::Ignored
        } else if line.starts_with(|c: char| c == ' ' || c == '\t') {
            Self::Header(trimmed)
        } else {
            Self::Pattern(trimmed)
        }
    }
}

/// Parser state carried from line to line: the rule currently being assembled
#[derive(Debug, Default)]
pub(crate) struct Accumulator {
    open: Option<Rule>,
}

impl Accumulator {
    /// Processes a line. Returns the previously open rule if this line starts a new one.
    pub(crate) fn feed(&mut self, number: usize, line: &str) -> Result<Option<Rule>, ParseError> {
        match Line::from(line) {
            Line::Ignored => Ok(None),
            Line::Header(trimmed) => {
                let malformed = |reason| ParseError::MalformedHeaderLine {
                    line: number,
                    content: line.to_owned(),
                    reason,
                };

                let rule = self
                    .open
                    .as_mut()
                    .ok_or_else(|| malformed("header without pattern"))?;

                let header = if let Some(name) = trimmed.strip_prefix('!') {
                    Header::detach(name.trim())
                } else {
                    let (name, value) = trimmed
                        .split_once(':')
                        .ok_or_else(|| malformed("invalid header"))?;
                    Header::new(name, value.trim())
                };
                rule.headers.push(header);
                Ok(None)
            }
            Line::Pattern(trimmed) => {
                let pattern = parse_pattern(number, trimmed)?;
                Ok(self.open.replace(Rule::new(pattern, Vec::new())))
            }
        }
    }

    /// Ends parsing, returns the rule still open if any.
    pub(crate) fn finish(self) -> Option<Rule> {
        self.open
    }
}

/// Parses a pattern line, either an absolute URL like `https://example.com/*` or a path like
/// `/static/*`.
pub(crate) fn parse_pattern(number: usize, text: &str) -> Result<Pattern, ParseError> {
    let malformed = |source| ParseError::MalformedPatternLine {
        line: number,
        pattern: text.to_owned(),
        source,
    };

    if let Some((scheme, host, rest)) = split_authority(text) {
        if has_port(host) {
            return Err(ParseError::InvalidPort {
                line: number,
                pattern: text.to_owned(),
            });
        }
        check_scheme(number, scheme)?;
        let host = normalize_host(host).map_err(malformed)?;

        let url = Url::parse(&format!("https://{HOST_PLACEHOLDER}{rest}")).map_err(malformed)?;
        return Ok(Pattern {
            scheme: scheme.map(str::to_owned),
            host: Some(host),
            path: decoded_path(&url),
            raw_path: path_part(rest).to_owned(),
        });
    }

    match Url::parse(text) {
        Ok(url) => {
            // Absolute URL in an unusual notation, e.g. `https:example.com`
            check_scheme(number, Some(url.scheme()))?;
            if url.port().is_some() {
                return Err(ParseError::InvalidPort {
                    line: number,
                    pattern: text.to_owned(),
                });
            }

            Ok(Pattern {
                scheme: Some(url.scheme().to_owned()),
                host: url.host_str().map(str::to_owned),
                path: decoded_path(&url),
                raw_path: url.path().to_owned(),
            })
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let url = Url::parse(RELATIVE_BASE)
                .and_then(|base| base.join(text))
                .map_err(malformed)?;

            Ok(Pattern {
                scheme: None,
                host: None,
                path: decoded_path(&url),
                raw_path: path_part(text).to_owned(),
            })
        }
        Err(err) => Err(malformed(err)),
    }
}

/// Splits `https://host/path` or `//host/path` into scheme, host and the remainder. The scheme is
/// matched case-insensitively, the host is returned exactly as written.
fn split_authority(text: &str) -> Option<(Option<&str>, &str, &str)> {
    let (scheme, rest) = if let Some(rest) = strip_prefix_ignore_case(text, "https://") {
        (Some("https"), rest)
    } else if let Some(rest) = strip_prefix_ignore_case(text, "http://") {
        (Some("http"), rest)
    } else if let Some(rest) = text.strip_prefix("//") {
        (None, rest)
    } else {
        return None;
    };

    let end = rest
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    Some((scheme, &rest[..end], &rest[end..]))
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

/// Brings a pattern host into the form the URL parser produces for request hosts: lowercase,
/// internationalized labels in punycode, IPv6 addresses without brackets.
///
/// Labels containing a splat or a placeholder are only lowercased around the token.
fn normalize_host(host: &str) -> Result<String, url::ParseError> {
    let has_token = host.split('.').any(|label| token_position(label).is_some());
    if host.starts_with('[') || !has_token {
        match Host::parse(host) {
            Ok(Host::Domain(domain)) => return Ok(domain),
            Ok(Host::Ipv4(addr)) => return Ok(addr.to_string()),
            Ok(Host::Ipv6(addr)) => return Ok(addr.to_string()),
            // Hosts like `subdomain.:1domain.com` never match a request but are accepted
            Err(url::ParseError::InvalidDomainCharacter | url::ParseError::IdnaError)
                if !host.starts_with('[') => {}
            Err(err) => return Err(err),
        }
    }

    let labels: Vec<String> = host.split('.').map(normalize_label).collect();
    Ok(labels.join("."))
}

fn normalize_label(label: &str) -> String {
    if let Some((start, end)) = token_position(label) {
        format!(
            "{}{}{}",
            label[..start].to_ascii_lowercase(),
            &label[start..end],
            label[end..].to_ascii_lowercase()
        )
    } else {
        match Host::parse(label) {
            Ok(Host::Domain(domain)) => domain,
            // Numeric labels aren't IPv4 addresses within a longer host name
            _ => label.to_ascii_lowercase(),
        }
    }
}

/// Position of the splat or placeholder within a host label
fn token_position(label: &str) -> Option<(usize, usize)> {
    label
        .find('*')
        .map(|start| (start, start + 1))
        .or_else(|| find_placeholder(label))
}

fn check_scheme(number: usize, scheme: Option<&str>) -> Result<(), ParseError> {
    match scheme {
        Some(scheme) if scheme != "https" => Err(ParseError::InvalidScheme {
            line: number,
            scheme: scheme.to_owned(),
        }),
        _ => Ok(()),
    }
}

/// Checks for a `:1234` suffix
fn has_port(host: &str) -> bool {
    host.rsplit_once(':').is_some_and(|(_, port)| {
        !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())
    })
}

fn path_part(text: &str) -> &str {
    text.find(|c: char| matches!(c, '?' | '#'))
        .map_or(text, |end| &text[..end])
}

fn decoded_path(url: &Url) -> String {
    percent_decode_str(url.path())
        .decode_utf8_lossy()
        .into_owned()
}
