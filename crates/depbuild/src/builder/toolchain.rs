//! macOS developer-tools selection.
//!
//! Older deployment targets need older Command Line Tools. Several versions are
//! installed side by side under `/Library/Developer/<n>/` and the active one is
//! switched with `xcode-select` for the duration of a run.

use crate::builder::exec::{Cmd, Executor};
use anyhow::{bail, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Command Line Tools location and the SDK used as sysroot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MacToolchain {
    pub developer_dir: PathBuf,
    pub sysroot: PathBuf,
}

/// Deployment target -> (Command Line Tools dir, SDK name).
const TOOLCHAINS: &[(&str, &str, &str)] = &[
    ("10.7", "/Library/Developer/10/CommandLineTools", "MacOSX10.14.sdk"),
    ("10.8", "/Library/Developer/10/CommandLineTools", "MacOSX10.14.sdk"),
    ("11.1", "/Library/Developer/13/CommandLineTools", "MacOSX11.sdk"),
];

impl MacToolchain {
    /// Toolchain for a deployment target.
    pub fn for_target(macos_target: &str) -> Result<Self> {
        let Some((_, dir, sdk)) = TOOLCHAINS.iter().find(|(t, _, _)| *t == macos_target) else {
            let known: Vec<_> = TOOLCHAINS.iter().map(|(t, _, _)| *t).collect();
            bail!(
                "No toolchain known for macOS target {macos_target} (supported: {})",
                known.join(", ")
            );
        };
        let developer_dir = PathBuf::from(dir);
        let sysroot = developer_dir.join("SDKs").join(sdk);
        Ok(Self {
            developer_dir,
            sysroot,
        })
    }
}

/// A toolchain switch that must be undone with [`ToolchainSwitch::restore`].
#[derive(Debug)]
pub struct ToolchainSwitch {
    previous: Option<String>,
    /// Command prefix that takes the developer dir as its last argument.
    selector: Cmd,
}

impl ToolchainSwitch {
    /// Make `toolchain` the active developer dir, remembering the previous one.
    ///
    /// In dry-run mode the current selection is not read; the switch is only logged.
    pub fn select(exec: &Executor, toolchain: &MacToolchain) -> Result<Self> {
        let wanted = toolchain.developer_dir.display().to_string();

        if exec.dry_run {
            exec.run(&xcode_select().arg(wanted))?;
            return Ok(Self::unswitched());
        }

        let current = exec.read_output(&Cmd::new("xcode-select").arg("-p"))?;
        if current == wanted {
            return Ok(Self::unswitched());
        }

        info!("required toolchain not selected, trying xcode-select");
        exec.run(&xcode_select().arg(wanted))?;
        Ok(Self::from_previous(current, xcode_select()))
    }

    /// A switch away from `previous`, restored by running `selector <previous>`.
    pub fn from_previous(previous: impl Into<String>, selector: Cmd) -> Self {
        Self {
            previous: Some(previous.into()),
            selector,
        }
    }

    fn unswitched() -> Self {
        Self {
            previous: None,
            selector: xcode_select(),
        }
    }

    pub fn switched(&self) -> bool {
        self.previous.is_some()
    }

    /// Put the previously active developer dir back.
    pub fn restore(self, exec: &Executor) -> Result<()> {
        match self.previous {
            Some(previous) => {
                info!("restoring developer dir {previous}");
                exec.run(&self.selector.arg(previous))
            }
            None => Ok(()),
        }
    }
}

fn xcode_select() -> Cmd {
    Cmd::new("sudo").args(["xcode-select", "-s"])
}
