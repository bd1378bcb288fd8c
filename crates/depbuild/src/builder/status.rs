//! Install-directory status, cleanup and host tool checks.

use crate::builder::components::registry::{names, COMPONENTS};
use crate::builder::context::Context;
use crate::builder::exec::{Executor, Step};
use crate::builder::target::{Platform, Target};
use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub name: &'static str,
    pub source_dir: PathBuf,
    pub source_present: bool,
    pub installed: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub target: Target,
    pub install_dir: PathBuf,
    pub components: Vec<ComponentStatus>,
}

impl StatusReport {
    pub fn collect(ctx: &Context) -> Self {
        let components = COMPONENTS
            .iter()
            .map(|c| {
                let source_dir = ctx.source_dir(c.source_dir());
                ComponentStatus {
                    name: c.name(),
                    source_present: source_dir.is_dir(),
                    installed: ctx
                        .install_dir
                        .join(c.installed_marker(&ctx.target))
                        .exists(),
                    source_dir,
                }
            })
            .collect();

        Self {
            target: ctx.target.clone(),
            install_dir: ctx.install_dir.clone(),
            components,
        }
    }

    pub fn installed_count(&self) -> usize {
        self.components.iter().filter(|c| c.installed).count()
    }
}

/// Print which components are installed for the current target.
pub fn status(ctx: &Context, json: bool) -> Result<()> {
    let report = StatusReport::collect(ctx);

    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize status")?;
        println!("{out}");
        return Ok(());
    }

    println!("Install dir: {}\n", report.install_dir.display());
    for c in &report.components {
        let state = if c.installed { "installed" } else { "missing" };
        let source = if c.source_present { "" } else { "  (no checkout)" };
        println!("  {:10} [{state}]{source}", c.name);
    }
    println!();
    println!(
        "  Total: {}/{} installed",
        report.installed_count(),
        report.components.len()
    );
    Ok(())
}

/// Delete the install directory of the current target.
pub fn clean(ctx: &Context, exec: &Executor) -> Result<()> {
    if !ctx.install_dir.exists() {
        info!("{} not present, nothing to clean", ctx.install_dir.display());
        return Ok(());
    }
    exec.execute(&[Step::RemoveDir(ctx.install_dir.clone())])?;
    info!("Cleaned {}", ctx.install_dir.display());
    Ok(())
}

/// External programs the builds for `platform` shell out to.
pub fn required_tools(platform: Platform) -> Vec<&'static str> {
    let mut tools = vec!["cmake", "git", "make", "sh"];
    match platform {
        Platform::MacOs => tools.extend(["clang++", "xcode-select", "sudo", "uname"]),
        Platform::Linux => tools.push("g++"),
        Platform::Windows => tools.push("cmd"),
    }
    tools
}

/// Check that every required tool is on `PATH`.
pub fn doctor(ctx: &Context) -> Result<()> {
    let mut ok = true;
    let components: Vec<_> = names().collect();
    println!(
        "Checking {} for {}",
        components.join(", "),
        ctx.target.platform_arch()
    );

    for tool in required_tools(ctx.target.platform) {
        match which::which(tool) {
            Ok(path) => println!("[OK] {tool} ({})", path.display()),
            Err(_) => {
                println!("[FAIL] missing `{tool}` in PATH");
                ok = false;
            }
        }
    }

    for c in COMPONENTS {
        let dir = ctx.source_dir(c.source_dir());
        if dir.is_dir() {
            println!("[OK] {}", dir.display());
        } else {
            println!("[FAIL] missing checkout: {}", dir.display());
            ok = false;
        }
    }

    if !ok {
        bail!("doctor checks failed");
    }
    Ok(())
}
