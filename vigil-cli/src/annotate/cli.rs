use clap::{Arg, Command, arg};

pub const ANNOTATE_CMD: &str = "annotate";

pub fn create_annotate_cli() -> Command {
    Command::new(ANNOTATE_CMD)
        .about("Evaluate sequence bundles against a reference model and report alerts and verdicts.")
        .arg(arg!(--model <MODEL> "Reference model JSON file").required(true))
        .arg(arg!(--bundles <BUNDLES> "Per-sequence alignment bundle JSON file").required(true))
        .arg(arg!(--config <CONFIG> "Engine configuration JSON file (defaults used when omitted)").required(false))
        .arg(
            Arg::new("fatal")
                .long("fatal")
                .required(false)
                .action(clap::ArgAction::Append)
                .help("Fatality override as code=yes|no, repeatable (e.g. --fatal mutstart=no)"),
        )
        .arg(arg!(--output <OUTPUT> "Alert report TSV (default: stdout)").required(false))
        .arg(arg!(--catalog <CATALOG> "Also write per-code catalog counts to this TSV").required(false))
}
