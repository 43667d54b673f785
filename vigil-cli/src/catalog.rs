use std::io::{self, Write};

use anyhow::Result;
use clap::{ArgMatches, Command, arg};

use vigil_core::models::AlertCode;

pub const CATALOG_CMD: &str = "catalog";

pub fn create_catalog_cli() -> Command {
    Command::new(CATALOG_CMD)
        .about("List every alert code with its default fatality, scope and description.")
        .arg(arg!(--scope <SCOPE> "Restrict to one scope: feature or sequence").required(false))
}

pub fn run_catalog(matches: &ArgMatches) -> Result<()> {
    let scope = matches.get_one::<String>("scope");
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for (i, code) in AlertCode::ALL.iter().enumerate() {
        if let Some(wanted) = scope {
            if code.scope().to_string() != *wanted {
                continue;
            }
        }
        writeln!(
            handle,
            "{}\t{}\t{}\t{}\t{}\t{}",
            i + 1,
            code,
            if code.default_fatal() { "yes" } else { "no" },
            code.short_desc(),
            code.scope(),
            code.long_desc(),
        )?;
    }
    Ok(())
}
