//! # depbuild
//!
//! Build the third-party libraries the application links against, for one
//! platform/architecture at a time.
//!
//! ## Usage
//!
//! ```bash
//! depbuild all -j 8                  # libwebp, FFmpeg, sentry, Boost
//! depbuild ffmpeg --arch arm64       # one dependency
//! depbuild boost --dry-run           # print the commands only
//! depbuild status                    # what is installed for this target
//! depbuild doctor                    # check tools and checkouts
//! ```
//!
//! ## Layout
//!
//! - Sources: `repos/<name>` (git checkouts, submodules pulled on demand)
//! - Output: `<platform>-<arch>` (`macos-<target>-<arch>` on macOS) below the output root

use anyhow::Result;
use clap::{Args, Parser};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use depbuild::builder;
use depbuild::builder::context::{Context, DEFAULT_REPOS_DIR};
use depbuild::builder::exec::Executor;
use depbuild::builder::target::{Platform, Target, DEFAULT_ARCH, DEFAULT_MACOS_TARGET};
use depbuild::builder::BuildCommands;

#[derive(Parser, Debug)]
#[command(name = "depbuild", about = "Dependencies build tool", version)]
struct Cli {
    #[command(subcommand)]
    command: BuildCommands,

    #[command(flatten)]
    options: Options,
}

#[derive(Args, Debug)]
struct Options {
    /// CPU architecture
    #[arg(long, global = true, default_value = DEFAULT_ARCH)]
    arch: String,

    /// macOS deployment target (forced to 11.1 for arm64)
    #[arg(long = "macos-target", global = true, default_value = DEFAULT_MACOS_TARGET)]
    macos_target: String,

    /// Use N CPU cores (0 lets the build tool decide)
    #[arg(short, long, global = true, value_name = "N", default_value_t = 0)]
    jobs: usize,

    /// Show compile/link commands
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Platform to build for (defaults to the host)
    #[arg(long, global = true, value_enum)]
    platform: Option<Platform>,

    /// Directory holding the dependency checkouts
    #[arg(long, global = true, env = "DEPBUILD_REPOS_DIR", default_value = DEFAULT_REPOS_DIR)]
    repos_dir: PathBuf,

    /// Directory the per-platform install dirs are created in
    #[arg(long, global = true, env = "DEPBUILD_OUTPUT_ROOT", default_value = ".")]
    output_root: PathBuf,

    /// Print what would run without building anything
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,
}

impl Options {
    fn target(&self) -> Target {
        Target::new(self.platform.unwrap_or_else(Platform::host), &self.arch)
            .macos_target(&self.macos_target)
            .jobs(self.jobs)
            .verbose(self.verbose)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.options.verbose);

    let exec = Executor::new(cli.options.dry_run);
    let ctx = Context::detect(
        cli.options.target(),
        &cli.options.repos_dir,
        &cli.options.output_root,
        &exec,
    )?;

    match &cli.command {
        BuildCommands::Status { json } => builder::status::status(&ctx, *json)?,
        BuildCommands::Clean => builder::status::clean(&ctx, &exec)?,
        BuildCommands::Doctor => builder::status::doctor(&ctx)?,
        command => builder::build(&ctx, &exec, &command.components())?,
    }

    Ok(())
}
