use anyhow::{Context, Result};
use clap::{crate_version, App, AppSettings, Arg, SubCommand};
use lectern::build::build_site;
use lectern::config::SiteConfig;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run() {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let matches = App::new("lectern")
        .version(crate_version!())
        .about("Builds a static blog from a directory of posts")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site")
                .arg(
                    Arg::with_name("project")
                        .long("project")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("The directory to search for `lectern.yaml` (defaults to the current directory)"),
                )
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Overrides the output directory from the project file"),
                ),
        )
        .get_matches();

    if let Some(matches) = matches.subcommand_matches("build") {
        let project = match matches.value_of("project") {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir().context("Getting the current directory")?,
        };
        let mut config = SiteConfig::from_directory(&project)?;
        if let Some(output) = matches.value_of("output") {
            config.output_directory = Path::new(output).to_owned();
        }

        let report = build_site(&config)?;
        info!(
            pages = report.pages.len(),
            cleanup_errors = report.cleanup_errors.len(),
            "built site in {}",
            config.output_directory.display()
        );
    }
    Ok(())
}
