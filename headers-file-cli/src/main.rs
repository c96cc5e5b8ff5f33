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

//! Command line tool evaluating `_headers` files against request URLs

use clap::Parser;
use headers_file::{parse_with_limits, File, Limits};
use log::{debug, error, trace};
use std::error::Error;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use url::Url;

/// Determine the response headers a `_headers` file assigns to request URLs
#[derive(Debug, Parser)]
#[command(version)]
struct Opt {
    /// The headers file to load
    headers_file: PathBuf,
    /// Request URLs to match against the rules, e.g. "https://example.com/index.html"
    url: Vec<String>,
    /// Print the parsed rules as YAML
    #[arg(long)]
    dump: bool,
    /// Enforce the hosting platform limits (100 rules, 2000 characters per line)
    #[arg(long)]
    strict: bool,
    /// Maximal number of rules, overrides other settings
    #[arg(long)]
    max_rules: Option<usize>,
    /// Maximal line length, overrides other settings
    #[arg(long)]
    max_line_length: Option<usize>,
    /// The path to a YAML configuration file with parser limits
    #[arg(short, long)]
    conf: Option<PathBuf>,
}

impl Opt {
    /// Combines limits from the configuration file with the command line flags.
    fn limits(&self) -> Result<Limits, Box<dyn Error>> {
        let mut limits = if self.strict {
            Limits::PAGES
        } else {
            Limits::UNLIMITED
        };

        if let Some(conf) = &self.conf {
            limits.merge_with(&load_limits(conf)?);
        }

        limits.merge_with(&Limits {
            max_rules: self.max_rules,
            max_line_length: self.max_line_length,
        });
        Ok(limits)
    }
}

fn load_limits(path: &Path) -> Result<Limits, Box<dyn Error>> {
    let file = fs::File::open(path)
        .map_err(|err| format!("failed opening configuration file {path:?}: {err}"))?;
    let limits: Limits = serde_yaml::from_reader(BufReader::new(file))
        .map_err(|err| format!("failed reading configuration file {path:?}: {err}"))?;
    trace!("Loaded configuration file: {limits:#?}");
    Ok(limits)
}

fn load_headers_file(path: &Path, limits: &Limits) -> Result<File, Box<dyn Error>> {
    let file = fs::File::open(path)
        .map_err(|err| format!("failed opening headers file {path:?}: {err}"))?;
    let headers = parse_with_limits(BufReader::new(file), limits)
        .map_err(|err| format!("{}: {err}", path.display()))?;
    debug!("Loaded {} rules from {path:?}", headers.len());
    Ok(headers)
}

fn run(opt: &Opt) -> Result<bool, Box<dyn Error>> {
    let limits = opt.limits()?;
    debug!("Parser limits: {limits:?}");

    let file = load_headers_file(&opt.headers_file, &limits)?;

    if opt.dump {
        print!("{}", serde_yaml::to_string(&file)?);
    }

    let mut success = true;
    for url in &opt.url {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(err) => {
                error!("Invalid URL {url:?}: {err}");
                success = false;
                continue;
            }
        };

        println!("{url}");
        for line in file.match_url(&parsed) {
            println!("  {line}");
        }
    }

    Ok(success)
}

fn main() -> ExitCode {
    env_logger::init();

    let opt = Opt::parse();

    match run(&opt) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
