use anyhow::Result;
use clap::{ArgMatches, Command};
use log::LevelFilter;
use std::path::PathBuf;

use alfs_cli::select;
use alfs_cli::select::input::RunConfig;
use alfs_cli::select::run::run_selection;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("ALFS_LOG", "error,alfs=info"))
        .init();

    let matches = Command::new("alfs")
        .version(clap::crate_version!())
        .author("Justin Sing <justincsing@gmail.com>")
        .about("Active learning feature selection for linear classifiers")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(select::command())
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Written by {author-with-newline}Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("select", sub_m)) => handle_select(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_select(matches: &ArgMatches) -> Result<()> {
    let config_path = match matches.get_one::<PathBuf>("config") {
        Some(path) => path,
        None => {
            log::warn!("No config file provided, printing a configuration template");
            println!("{}", serde_json::to_string_pretty(&RunConfig::default())?);
            return Ok(());
        }
    };
    log::info!("[ALFS::Select] Running from config: {:?}", config_path);

    let params = match RunConfig::from_arguments(config_path, matches) {
        Ok(params) => params,
        Err(e) => {
            log::error!("Invalid configuration: {:#}", e);
            std::process::exit(1)
        }
    };

    match run_selection(&params) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Selection failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
