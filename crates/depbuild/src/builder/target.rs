//! Build target: platform, architecture, deployment target and tool knobs.

use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_ARCH: &str = "x86_64";
pub const DEFAULT_MACOS_TARGET: &str = "10.8";

/// Apple Silicon cannot target anything older than Big Sur.
const ARM64_MACOS_TARGET: &str = "11.1";

/// Operating system the dependencies are built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[value(name = "macos")]
    MacOs,
    #[value(name = "linux")]
    Linux,
    #[value(name = "windows")]
    Windows,
}

impl Platform {
    /// Platform of the machine running the build.
    pub fn host() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Linux
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::MacOs => "macos",
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// What to build for, and how hard to push the wrapped tools.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Target {
    pub platform: Platform,
    pub arch: String,
    pub macos_target: String,
    /// Parallel jobs handed to the build tool; 0 leaves the tool default.
    pub jobs: usize,
    pub verbose: bool,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            platform: Platform::host(),
            arch: DEFAULT_ARCH.to_string(),
            macos_target: DEFAULT_MACOS_TARGET.to_string(),
            jobs: 0,
            verbose: false,
        }
    }
}

impl Target {
    pub fn new(platform: Platform, arch: &str) -> Self {
        Self {
            platform,
            arch: arch.to_string(),
            ..Self::default()
        }
        .normalized()
    }

    #[must_use]
    pub fn macos_target(mut self, version: &str) -> Self {
        self.macos_target = version.to_string();
        self.normalized()
    }

    #[must_use]
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Apply platform constraints that override user input.
    fn normalized(mut self) -> Self {
        if self.is_macos() && self.arch == "arm64" {
            self.macos_target = ARM64_MACOS_TARGET.to_string();
        }
        self
    }

    pub fn is_macos(&self) -> bool {
        self.platform == Platform::MacOs
    }

    pub fn is_windows(&self) -> bool {
        self.platform == Platform::Windows
    }

    pub fn is_linux(&self) -> bool {
        self.platform == Platform::Linux
    }

    /// Directory name for this target, e.g. `macos-10.8-x86_64` or `linux-x86_64`.
    pub fn platform_arch(&self) -> String {
        if self.is_macos() {
            format!("{}-{}-{}", self.platform, self.macos_target, self.arch)
        } else {
            format!("{}-{}", self.platform, self.arch)
        }
    }

    /// Install directory below `output_root`.
    pub fn install_dir(&self, output_root: &Path) -> PathBuf {
        output_root.join(self.platform_arch())
    }

    /// `-j N` style arguments, empty when the tool should pick.
    pub fn jobs_args(&self) -> Vec<String> {
        if self.jobs > 0 {
            vec!["-j".to_string(), self.jobs.to_string()]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macos_platform_arch_includes_deployment_target() {
        let target = Target::new(Platform::MacOs, "x86_64");
        assert_eq!(target.platform_arch(), "macos-10.8-x86_64");
    }

    #[test]
    fn test_non_macos_platform_arch() {
        assert_eq!(Target::new(Platform::Linux, "x86_64").platform_arch(), "linux-x86_64");
        assert_eq!(Target::new(Platform::Windows, "x86_64").platform_arch(), "windows-x86_64");
    }

    #[test]
    fn test_arm64_forces_big_sur_target() {
        let target = Target::new(Platform::MacOs, "arm64").macos_target("10.7");
        assert_eq!(target.macos_target, "11.1");
        assert_eq!(target.platform_arch(), "macos-11.1-arm64");
    }

    #[test]
    fn test_arm64_on_linux_keeps_target() {
        let target = Target::new(Platform::Linux, "arm64").macos_target("10.7");
        assert_eq!(target.macos_target, "10.7");
    }

    #[test]
    fn test_install_dir_joins_output_root() {
        let target = Target::new(Platform::Linux, "x86_64");
        assert_eq!(
            target.install_dir(Path::new("/work")),
            PathBuf::from("/work/linux-x86_64")
        );
    }

    #[test]
    fn test_jobs_args_only_when_positive() {
        let target = Target::new(Platform::Linux, "x86_64");
        assert!(target.jobs_args().is_empty());
        assert_eq!(target.jobs(8).jobs_args(), vec!["-j", "8"]);
    }
}
