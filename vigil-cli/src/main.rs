mod annotate;
mod catalog;

use anyhow::Result;
use clap::Command;
use env_logger::Env;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "vigil";
    pub const BIN_NAME: &str = "vigil";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Validate and annotate biological sequences against curated reference models, flagging every discrepancy with a stable alert code.")
        .subcommand_required(true)
        .subcommand(annotate::cli::create_annotate_cli())
        .subcommand(catalog::create_catalog_cli())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        //
        // ANNOTATE
        //
        Some((annotate::cli::ANNOTATE_CMD, matches)) => {
            annotate::handlers::run_annotate(matches)?;
        }

        //
        // ALERT CATALOG
        //
        Some((catalog::CATALOG_CMD, matches)) => {
            catalog::run_catalog(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_builds() {
        build_parser().debug_assert();
    }
}
