pub mod input;
pub mod run;

use clap::{Arg, ArgAction, Command, ValueHint};
use std::path::PathBuf;

/// The `select` subcommand.
pub fn command() -> Command {
    Command::new("select")
        .about("Actively select a discriminative feature set from a labelled sample table")
        .arg(
            Arg::new("config")
                .help("Path to the run configuration file (JSON)")
                .required(false)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("data")
                .short('d')
                .long("data")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "Path to the sample table (*.tsv or *.csv). \
                     Overrides the data file specified in the configuration file.",
                )
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .long("output-dir")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "Directory the selection history, split and timing are written to. \
                     Overrides the directory specified in the configuration file.",
                )
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("classifier")
                .long("classifier")
                .help("Linear classifier family. Overrides the configuration file.")
                .value_parser(["max-margin", "lp"])
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("balance")
                .long("balance")
                .help("Draw samples class-balanced.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Random seed for the train/test split and sample draws.")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .help("Worker threads for candidate evaluation.")
                .value_parser(clap::value_parser!(usize)),
        )
}
