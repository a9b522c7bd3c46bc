// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use pathsync::{
    config::Config,
    env::{Environment, Scope, ScopePair, ScopeSelection, SystemEnvironment, PATH_SEPARATOR},
    link::{LinkOutcome, OnConflict, ProfileLink},
    path::default_config_file,
    sync::PathSynchronizer,
};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use inquire::Confirm;
use std::{ffi::OsString, path::PathBuf, process::exit};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  pathsync [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<i32> {
        let config = self.config;
        match self.command {
            Command::Sync(opts) => run_sync(&load_config(config)?, opts).map(|_| 0),
            Command::Exec(opts) => run_exec(&load_config(config)?, opts),
            Command::List(opts) => run_list(opts).map(|_| 0),
            Command::Link(opts) => run_link(&load_config(config)?, opts).map(|_| 0),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Print merged PATH for the calling shell to assign.
    #[command(override_usage = "pathsync sync [options]")]
    Sync(SyncOptions),

    /// Run program with merged PATH.
    #[command(override_usage = "pathsync exec [options] <program> [<args>]...")]
    Exec(ExecOptions),

    /// List PATH entries of one scope.
    #[command(override_usage = "pathsync list <scope>")]
    List(ListOptions),

    /// Link shell profile into place.
    #[command(override_usage = "pathsync link [options]")]
    Link(LinkOptions),
}

#[derive(Args, Clone, Debug)]
struct ScopeOptions {
    /// Pair of scopes to merge, e.g., "user+machine".
    #[arg(short, long, value_name = "scope+scope")]
    pub mode: Option<ScopePair>,

    /// Give the right-hand scope of the pair priority.
    #[arg(short, long, overrides_with = "no_reverse")]
    pub reverse: bool,

    /// Give the left-hand scope of the pair priority.
    #[arg(long, overrides_with = "reverse")]
    pub no_reverse: bool,
}

impl ScopeOptions {
    fn reverse_override(&self) -> Option<bool> {
        match (self.reverse, self.no_reverse) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    fn selection(&self, config: &Config) -> ScopeSelection {
        config
            .sync
            .with_overrides(self.mode, self.reverse_override())
    }
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct SyncOptions {
    #[command(flatten)]
    pub scopes: ScopeOptions,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ExecOptions {
    #[command(flatten)]
    pub scopes: ScopeOptions,

    /// Program to run followed by its arguments.
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "program"
    )]
    pub command: Vec<OsString>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ListOptions {
    /// Scope to list: process, user, or machine.
    #[arg(required = true, value_name = "scope")]
    pub scope: Scope,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct LinkOptions {
    /// Profile script to link to.
    #[arg(short, long, value_name = "path")]
    pub source: Option<PathBuf>,

    /// Location to place the link at.
    #[arg(short, long, value_name = "path")]
    pub target: Option<PathBuf>,

    /// Back up existing target without asking.
    #[arg(short, long)]
    pub force: bool,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    match run() {
        Ok(code) => exit(code),
        Err(error) => {
            error!("{error:?}");
            exit(1);
        }
    }
}

fn run() -> Result<i32> {
    Cli::parse().run()
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(default_config_file()?)?,
    };

    Ok(config)
}

fn run_sync(config: &Config, opts: SyncOptions) -> Result<()> {
    let sync = PathSynchronizer::new(SystemEnvironment::new());
    let merged = sync.merged(&opts.scopes.selection(config))?;
    println!("{}", merged.join(PATH_SEPARATOR));

    Ok(())
}

fn run_exec(config: &Config, opts: ExecOptions) -> Result<i32> {
    let mut sync = PathSynchronizer::new(SystemEnvironment::new());
    sync.apply(&opts.scopes.selection(config))?;

    let (program, args) = opts
        .command
        .split_first()
        .ok_or_else(|| anyhow!("no program given to run"))?;
    let status = std::process::Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("cannot run {program:?}"))?;

    match status.code() {
        Some(code) => Ok(code),
        None => {
            warn!("{program:?} terminated without exit code");
            Ok(1)
        }
    }
}

fn run_list(opts: ListOptions) -> Result<()> {
    let entries = SystemEnvironment::new().read(opts.scope)?;
    for entry in entries.iter() {
        println!("{entry}");
    }

    Ok(())
}

fn run_link(config: &Config, opts: LinkOptions) -> Result<()> {
    let link = ProfileLink::resolve(opts.source, opts.target, config.profile.as_ref())?;
    if link.is_conflicting() && !opts.force {
        let prompt = format!(
            "{} already exists, back it up and link to {}?",
            link.target().display(),
            link.source().display()
        );
        if !Confirm::new(prompt.as_str()).with_default(false).prompt()? {
            info!("leave {} untouched", link.target().display());
            return Ok(());
        }
    }

    match link.install(OnConflict::Backup)? {
        LinkOutcome::Created | LinkOutcome::AlreadyLinked => {}
        LinkOutcome::Replaced { backup } => {
            info!("previous profile kept at {}", backup.display())
        }
    }

    Ok(())
}
