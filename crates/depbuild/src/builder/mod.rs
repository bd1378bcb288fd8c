//! Dependency builder.
//!
//! Structure:
//! - `target` - platform/arch selection and install-dir naming
//! - `context` - resolved directories and host facts
//! - `exec` - commands, plan steps and the executor
//! - `toolchain` - macOS Command Line Tools switching
//! - `fsops` - install-tree post-processing
//! - `components/` - one module per third-party library
//! - `status` - status report, clean, doctor

pub mod components;
pub mod context;
pub mod exec;
pub mod fsops;
pub mod status;
pub mod target;
pub mod toolchain;

use anyhow::{bail, Result};
use clap::Subcommand;
use components::registry::COMPONENTS;
use components::Buildable;
use context::Context;
use exec::Executor;
use toolchain::ToolchainSwitch;
use tracing::info;

/// Commands for the CLI.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum BuildCommands {
    /// Build every dependency (libwebp, FFmpeg, sentry, Boost)
    All,
    /// Build libwebp
    Libwebp,
    /// Build FFmpeg
    Ffmpeg,
    /// Build sentry-native
    Sentry,
    /// Build Boost
    Boost,
    /// Show which dependencies are installed for the target
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the install directory of the target
    Clean,
    /// Check that required tools and source checkouts are present
    Doctor,
}

impl BuildCommands {
    /// Components this command builds, in build order. Empty for non-build commands.
    pub fn components(&self) -> Vec<&'static dyn Buildable> {
        let name = match self {
            Self::All => return COMPONENTS.to_vec(),
            Self::Libwebp => "libwebp",
            Self::Ffmpeg => "ffmpeg",
            Self::Sentry => "sentry",
            Self::Boost => "boost",
            Self::Status { .. } | Self::Clean | Self::Doctor => return Vec::new(),
        };
        components::registry::get(name).into_iter().collect()
    }
}

/// Build `components` in order.
///
/// On macOS the Command Line Tools matching the deployment target are selected
/// first and the previous selection is restored afterwards.
pub fn build(ctx: &Context, exec: &Executor, components: &[&dyn Buildable]) -> Result<()> {
    let switch = match &ctx.toolchain {
        Some(toolchain) if ctx.target.is_macos() => {
            Some(ToolchainSwitch::select(exec, toolchain)?)
        }
        _ => None,
    };
    build_switched(ctx, exec, components, switch)
}

/// Build `components`, then undo `switch`, also when a build fails.
///
/// A build error takes precedence over a failed restore.
pub fn build_switched(
    ctx: &Context,
    exec: &Executor,
    components: &[&dyn Buildable],
    switch: Option<ToolchainSwitch>,
) -> Result<()> {
    let result = components
        .iter()
        .try_for_each(|component| build_one(ctx, exec, *component));

    let restored = match switch {
        Some(switch) if switch.switched() => switch.restore(exec),
        _ => Ok(()),
    };
    result?;
    restored
}

/// Build a single component.
pub fn build_one(ctx: &Context, exec: &Executor, component: &dyn Buildable) -> Result<()> {
    info!("=== Building {} ===", component.name());

    let src = ctx.source_dir(component.source_dir());
    if !exec.dry_run && !src.is_dir() {
        bail!(
            "{} sources not found at {}. Check out the {} repository there first",
            component.name(),
            src.display(),
            component.source_dir()
        );
    }

    let steps = component.plan(ctx)?;
    exec.execute(&steps)?;

    info!("  Installed {} into {}", component.name(), ctx.install_dir.display());
    Ok(())
}
