//! Resolved build context: target, directories and host facts.
//!
//! Everything components need to know about the machine is captured here once,
//! so plans are pure functions of a `Context`.

use crate::builder::exec::{Cmd, Executor};
use crate::builder::target::{Platform, Target};
use crate::builder::toolchain::MacToolchain;
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_REPOS_DIR: &str = "repos";

#[derive(Clone, Debug)]
pub struct Context {
    pub target: Target,
    /// Parent of the dependency source checkouts.
    pub repos_dir: PathBuf,
    /// `<output_root>/<platform-arch>`.
    pub install_dir: PathBuf,
    /// `uname -m` of the build host (macOS only).
    pub host_arch: Option<String>,
    pub toolchain: Option<MacToolchain>,
    /// Value of `MSYSTEM`, set inside MSYS2 shells.
    pub msystem: Option<String>,
    /// C++ compiler handed to Boost.Build.
    pub cxx: Option<PathBuf>,
}

impl Context {
    /// Context without looking at the host.
    pub fn new(target: Target, repos_dir: impl Into<PathBuf>, output_root: &Path) -> Self {
        let install_dir = target.install_dir(output_root);
        Self {
            target,
            repos_dir: repos_dir.into(),
            install_dir,
            host_arch: None,
            toolchain: None,
            msystem: None,
            cxx: None,
        }
    }

    /// Context with host facts filled in from the environment.
    pub fn detect(
        target: Target,
        repos_dir: &Path,
        output_root: &Path,
        exec: &Executor,
    ) -> Result<Self> {
        let repos_dir = std::path::absolute(repos_dir)
            .with_context(|| format!("Invalid repos dir {}", repos_dir.display()))?;
        let output_root = std::path::absolute(output_root)
            .with_context(|| format!("Invalid output root {}", output_root.display()))?;

        let mut ctx = Self::new(target, repos_dir, &output_root);
        ctx.msystem = std::env::var("MSYSTEM").ok();

        let compiler = match ctx.target.platform {
            Platform::MacOs => Some("clang++"),
            Platform::Linux => Some("g++"),
            Platform::Windows => None,
        };
        ctx.cxx = compiler.and_then(|c| resolve_compiler(c, exec.dry_run));

        if ctx.target.is_macos() {
            ctx.toolchain = Some(MacToolchain::for_target(&ctx.target.macos_target)?);
            let uname = Cmd::new("uname").arg("-m");
            ctx.host_arch = if exec.dry_run {
                exec.read_output(&uname).ok()
            } else {
                Some(exec.read_output(&uname)?)
            };
        }

        debug!(?ctx, "resolved build context");
        Ok(ctx)
    }

    #[must_use]
    pub fn host_arch(mut self, arch: &str) -> Self {
        self.host_arch = Some(arch.to_string());
        self
    }

    #[must_use]
    pub fn toolchain(mut self, toolchain: MacToolchain) -> Self {
        self.toolchain = Some(toolchain);
        self
    }

    #[must_use]
    pub fn msystem(mut self, msystem: &str) -> Self {
        self.msystem = Some(msystem.to_string());
        self
    }

    #[must_use]
    pub fn cxx(mut self, compiler: impl Into<PathBuf>) -> Self {
        self.cxx = Some(compiler.into());
        self
    }

    pub fn source_dir(&self, name: &str) -> PathBuf {
        self.repos_dir.join(name)
    }

    /// Running inside a plain MSYS2 shell (not MinGW).
    pub fn is_msys(&self) -> bool {
        self.msystem.as_deref() == Some("MSYS")
    }

    /// macOS host whose CPU differs from the target arch.
    pub fn is_cross_compilation(&self) -> bool {
        self.target.is_macos()
            && self
                .host_arch
                .as_deref()
                .is_some_and(|host| host != self.target.arch)
    }

    pub fn sysroot(&self) -> Result<&Path> {
        self.toolchain
            .as_ref()
            .map(|tc| tc.sysroot.as_path())
            .context("No macOS toolchain resolved for this target")
    }

    pub fn cxx_compiler(&self) -> Result<&Path> {
        self.cxx
            .as_deref()
            .context("No C++ compiler found in PATH")
    }

    /// Install dir as a string for flag assembly.
    pub fn inst(&self) -> String {
        self.install_dir.display().to_string()
    }
}

/// Full path of `name` from `PATH`. A dry run falls back to the bare name.
pub fn resolve_compiler(name: &str, dry_run: bool) -> Option<PathBuf> {
    which::which(name)
        .ok()
        .or_else(|| dry_run.then(|| PathBuf::from(name)))
}
