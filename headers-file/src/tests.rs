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

use crate::{parse_str, File, Header, ParseError, Pattern, Rule};

use test_log::test;
use url::Url;

const BASIC: &str = r#"# This is a comment
/secure/page
  X-Frame-Options: DENY
  X-Content-Type-Options: nosniff
  Referrer-Policy: no-referrer

/static/*
  Access-Control-Allow-Origin: *
  X-Robots-Tag: nosnippet

https://myproject.pages.dev/*
  X-Robots-Tag: noindex
"#;

const PLACEHOLDERS: &str = r#"/movies/:title
  x-movie-name: You are watching ":title"

https://:subdomain.example.com/*
  x-subdomain: :subdomain

/double/:ref
  x-ref: :ref and :ref

https://:subdomain.example.dev/*
  x-subdomain: :subdomain and :subdomain
"#;

fn make_file(text: &str) -> File {
    parse_str(text).unwrap()
}

fn match_url(file: &File, url: &str) -> Vec<String> {
    let mut result = file.match_url(&Url::parse(url).unwrap());
    result.sort();
    result
}

fn sorted(list: &[&str]) -> Vec<String> {
    let mut list: Vec<String> = list.iter().map(|s| (*s).to_owned()).collect();
    list.sort();
    list
}

#[test]
fn parse_basic() {
    assert_eq!(
        make_file(BASIC),
        File::new(vec![
            Rule::new(
                Pattern::path("/secure/page"),
                vec![
                    Header::new("X-Frame-Options", "DENY"),
                    Header::new("X-Content-Type-Options", "nosniff"),
                    Header::new("Referrer-Policy", "no-referrer"),
                ]
            ),
            Rule::new(
                Pattern::path("/static/*"),
                vec![
                    Header::new("Access-Control-Allow-Origin", "*"),
                    Header::new("X-Robots-Tag", "nosnippet"),
                ]
            ),
            Rule::new(
                Pattern::host("myproject.pages.dev", "/*"),
                vec![Header::new("X-Robots-Tag", "noindex")]
            ),
        ])
    );
}

#[test]
fn parse_absolute() {
    assert!(parse_str("https://myproject.pages.dev/*\n\tx-should-not: be-parsed").is_ok());

    let err = parse_str("http://myproject.pages.dev/*\n\tx-should-not: be-parsed").unwrap_err();
    assert!(matches!(err, ParseError::InvalidScheme { .. }), "{err:?}");

    let err =
        parse_str("https://myproject.pages.dev:1234/*\n\tx-should-not: be-parsed").unwrap_err();
    assert!(matches!(err, ParseError::InvalidPort { .. }), "{err:?}");
}

#[test]
fn parse_detach() {
    let file = make_file(
        "/*\n  Content-Security-Policy: default-src 'self';\n\n/*.jpg\n  ! Content-Security-Policy",
    );
    assert_eq!(
        file.into_rules(),
        vec![
            Rule::new(
                Pattern::path("/*"),
                vec![Header::new(
                    "Content-Security-Policy",
                    "default-src 'self';"
                )]
            ),
            Rule::new(
                Pattern::path("/*.jpg"),
                vec![Header::detach("Content-Security-Policy")]
            ),
        ]
    );
}

#[test]
fn parse_empty() {
    assert!(make_file("").is_empty());
    assert!(make_file("# only a comment\n\n   \n").is_empty());

    // A pattern without headers is still a rule
    let file = make_file("/lonely");
    assert_eq!(file.len(), 1);
    assert!(file[0].headers.is_empty());
}

#[test]
fn parse_fails_fast() {
    let err = parse_str("/ok\n  X-Test: 1\n/broken\n  no colon here\n/never\n  X: y\n")
        .unwrap_err();
    assert_eq!(err.line(), Some(4));
}

#[test]
fn absolute_url_ignores_port_and_scheme() {
    let file = make_file("https://example.com/*\n  X-Frame-Options: DENY\n");

    for url in [
        "https://example.com/secure/page",
        "https://example.com:1234/secure/page",
        "other://example.com/secure/page",
    ] {
        assert_eq!(match_url(&file, url), vec!["X-Frame-Options: DENY"], "{url}");
    }
}

#[test]
fn path_rules_ignore_port_and_scheme() {
    let file = make_file("/secure/page\n  X-Frame-Options: DENY\n");

    for url in [
        "https://example.com/secure/page",
        "http://example.com:8080/secure/page",
        "ftp://other.example/secure/page",
    ] {
        assert_eq!(match_url(&file, url), vec!["X-Frame-Options: DENY"], "{url}");
    }
}

#[test]
fn match_detach() {
    let file = make_file(
        "/*\n  Content-Security-Policy: default-src 'self';\n\n/*.jpg\n  ! Content-Security-Policy\n",
    );

    assert!(match_url(&file, "https://custom.domain/any/path/image.jpg").is_empty());
    assert!(match_url(&file, "https://custom.domain/image.jpg").is_empty());
    assert_eq!(
        match_url(&file, "https://custom.domain/index.html"),
        vec!["Content-Security-Policy: default-src 'self';"]
    );
}

#[test]
fn match_detach_order() {
    let file = make_file(
        "/*\n  X-Test: first\n\n/index.html\n  ! X-Test\n  X-Other: 1\n\n/*\n  X-Test: second\n",
    );

    assert_eq!(
        match_url(&file, "https://example.com/index.html"),
        vec!["X-Other: 1", "X-Test: second"]
    );
    assert_eq!(
        match_url(&file, "https://example.com/about.html"),
        vec!["X-Test: first,second"]
    );
}

#[test]
fn match_basic() {
    let file = make_file(BASIC);

    let tests = [
        (
            "path",
            "http://example.com/secure/page",
            sorted(&[
                "X-Frame-Options: DENY",
                "X-Content-Type-Options: nosniff",
                "Referrer-Policy: no-referrer",
            ]),
        ),
        (
            "splat",
            "https://custom.domain/static/image.jpg",
            sorted(&["Access-Control-Allow-Origin: *", "X-Robots-Tag: nosnippet"]),
        ),
        (
            "host",
            "https://myproject.pages.dev/home",
            sorted(&["X-Robots-Tag: noindex"]),
        ),
        (
            "host and path",
            "https://myproject.pages.dev/secure/page",
            sorted(&[
                "X-Frame-Options: DENY",
                "X-Content-Type-Options: nosniff",
                "Referrer-Policy: no-referrer",
                "X-Robots-Tag: noindex",
            ]),
        ),
        (
            "host and splat",
            "https://myproject.pages.dev/static/styles.css",
            sorted(&[
                "Access-Control-Allow-Origin: *",
                "X-Robots-Tag: nosnippet,noindex",
            ]),
        ),
        (
            "splat is not recursive",
            "https://custom.domain/static/css/styles.css",
            Vec::new(),
        ),
        ("nothing", "https://custom.domain/", Vec::new()),
    ];

    for (name, url, expected) in tests {
        assert_eq!(match_url(&file, url), expected, "{name}");
    }
}

#[test]
fn match_exact_in_order() {
    let file = make_file(BASIC);
    assert_eq!(
        file.match_url(&Url::parse("https://custom.domain/secure/page").unwrap()),
        vec![
            "X-Frame-Options: DENY",
            "X-Content-Type-Options: nosniff",
            "Referrer-Policy: no-referrer",
        ]
    );
}

#[test]
fn match_placeholders() {
    let file = make_file(PLACEHOLDERS);

    let tests = [
        (
            "path",
            "https://example.com/movies/star-wars",
            vec![r#"x-movie-name: You are watching "star-wars""#],
        ),
        (
            "non-greedy path",
            "https://example.com/movies/star-wars/episode-1",
            vec![],
        ),
        (
            "non-greedy domain",
            "https://sub.dub.example.com/whatever",
            vec![],
        ),
        (
            "domain",
            "https://custom.example.com/whatever",
            vec!["x-subdomain: custom"],
        ),
        (
            "path double",
            "https://example.dev/double/123",
            vec!["x-ref: 123 and :ref"],
        ),
        (
            "domain double",
            "https://sub.example.dev/whatever",
            vec!["x-subdomain: sub and :subdomain"],
        ),
    ];

    for (name, url, expected) in tests {
        assert_eq!(match_url(&file, url), expected, "{name}");
    }
}

#[test]
fn match_invalid_placeholder() {
    let file = make_file(
        "/secure/:1page\n  x-placeholder: :1page\n\nhttps://subdomain.:1domain.com/*\n  x-placeholder: :1domain\n",
    );

    assert!(match_url(&file, "https://subdomain.example.com/secure/example").is_empty());

    // Literal match still works
    assert_eq!(
        match_url(&file, "https://example.com/secure/:1page"),
        vec!["x-placeholder: :1page"]
    );
}

#[test]
fn match_splat_substitution() {
    let file = make_file("/assets/*\n  Link: </assets/:splat>; rel=preload\n  X-Star: *\n");
    assert_eq!(
        match_url(&file, "https://example.com/assets/app.js"),
        vec!["Link: </assets/app.js>; rel=preload", "X-Star: *"]
    );
}

#[test]
fn match_host_splat() {
    let file = make_file("https://*.example.com/\n  X-Preview: :splat\n");
    assert_eq!(
        match_url(&file, "https://preview.example.com/any/path"),
        vec!["X-Preview: preview"]
    );
    assert!(match_url(&file, "https://a.b.example.com/").is_empty());
    assert!(match_url(&file, "https://example.com/").is_empty());
}

#[test]
fn match_unusual_urls() {
    let file = make_file(BASIC);
    for url in [
        "data:text/plain,hello",
        "mailto:someone@example.com",
        "https://xn--caf-dma.example/%FF%FE",
        "file:///",
    ] {
        assert!(match_url(&file, url).is_empty(), "{url}");
    }

    // Path rules apply regardless of the host
    assert_eq!(
        match_url(&file, "file:///static/image.jpg"),
        sorted(&["Access-Control-Allow-Origin: *", "X-Robots-Tag: nosnippet"])
    );
}

#[test]
fn match_normalized_hosts() {
    let file = make_file(
        "https://MyProject.pages.dev/*\n  X-A: 1\n\nhttps://café.example/*\n  X-B: 2\n\nhttps://:Sub.Example.com/*\n  X-Sub: :Sub\n",
    );

    assert_eq!(match_url(&file, "https://MyProject.pages.dev/"), vec!["X-A: 1"]);
    assert_eq!(match_url(&file, "https://myproject.pages.dev/"), vec!["X-A: 1"]);
    assert_eq!(match_url(&file, "https://café.example/"), vec!["X-B: 2"]);
    assert_eq!(match_url(&file, "https://CAFÉ.example/"), vec!["X-B: 2"]);
    assert_eq!(match_url(&file, "https://xn--caf-dma.example/"), vec!["X-B: 2"]);
    assert_eq!(match_url(&file, "https://WWW.example.com/"), vec!["X-Sub: www"]);
}
