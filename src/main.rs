use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use gclone::cli::Cli;
use gclone::config::Config;
use gclone::git::GitError;
use gclone::git::cli::GitCli;
use gclone::output::{self, Verbosity};
use gclone::request::RunOptions;
use gclone::{flow, logging, report};
use std::io;
use std::process;

fn main() {
    let cli = Cli::parse();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    output::set_verbosity(verbosity);
    logging::init(verbosity);

    if let Err(e) = run(&cli) {
        eprintln!("{} {}", "Error:".red().bold(), format!("{e:#}").red());
        if verbosity == Verbosity::Verbose
            && let Some(git_error) = e.downcast_ref::<GitError>()
        {
            eprintln!("\n{}\n{}", git_error.error_type().yellow(), git_error.hint());
        }
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::resolve(cli.config.as_deref())?;
    config.apply_output();

    let options = RunOptions::from_cli(cli, &config)?;
    tracing::debug!(?options, "resolved options");

    let provider = GitCli::new(output::show_progress())?;
    let result = flow::run(&provider, &options)?;

    if options.show_last_commit {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        report::show_last_commit(
            &provider,
            Some(&result.repo),
            &options.request.destination,
            &mut out,
        )?;
    }

    Ok(())
}
