//! Print the OpenAPI document as pretty JSON, or write it to a file.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use hall_booking::ApiDoc;
use utoipa::OpenApi;

/// `openapi-dump` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "openapi-dump",
    about = "Emit the hall booking OpenAPI document",
    version
)]
struct CliArgs {
    /// Write to this path instead of standard output.
    #[arg(long, short, value_name = "path")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = CliArgs::parse();
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .wrap_err("failed to serialise OpenAPI document")?;
    match args.output {
        Some(path) => std::fs::write(&path, format!("{json}\n"))
            .wrap_err_with(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").wrap_err("failed to write to stdout")?;
        }
    }
    Ok(())
}
