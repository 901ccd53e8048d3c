mod cli;
mod commands;
mod config;
mod paths;
mod render;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match run(&ctx, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Plan(args) => commands::plan::plan(ctx, args),
        Command::Validate(args) => commands::plan::validate(ctx, args),
        Command::Order(args) => commands::plan::order(ctx, args),
        Command::Diff(args) => commands::diff::run(ctx, args),
        Command::AddMember(args) => commands::member::run(ctx, args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "ssoplan", &mut io::stdout());
            Ok(())
        }
    }
}

/// Print the error chain, plus advice when a planning error is underneath
fn report(err: &anyhow::Error) {
    ui::error(&format!("{err:#}"));
    if let Some(planning) = err.downcast_ref::<identitycenter::Error>() {
        let category = planning.category();
        eprintln!("  {}: {}", category.description(), category.advice());
    }
}
