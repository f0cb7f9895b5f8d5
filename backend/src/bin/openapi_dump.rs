//! Print the OpenAPI document as JSON or YAML.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use santa_backend::doc::ApiDoc;
use utoipa::OpenApi;

/// Output encodings for the document.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Format {
    #[default]
    Json,
    Yaml,
}

/// `openapi-dump` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "openapi-dump", about = "Print the HTTP API OpenAPI document", version)]
struct CliArgs {
    /// Encoding of the document.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
    /// Write to this file instead of stdout.
    #[arg(long, value_name = "path")]
    output: Option<PathBuf>,
}

fn render(format: Format) -> io::Result<String> {
    let document = ApiDoc::openapi();
    match format {
        Format::Json => document.to_pretty_json().map_err(io::Error::other),
        Format::Yaml => document.to_yaml().map_err(io::Error::other),
    }
}

fn main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let rendered = render(args.format)?;
    match args.output {
        Some(path) => fs::write(path, format!("{rendered}\n")),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{rendered}")
        }
    }
}
