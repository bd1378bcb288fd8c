//! Configure/build/install argument lists for CMake projects.

use super::strings;
use crate::builder::exec::{Cmd, Step};
use crate::builder::target::Target;
use std::path::Path;

pub(super) const BUILD_DIR: &str = "build";

pub(super) struct CMake {
    pub configure: Vec<String>,
    pub build: Vec<String>,
    pub install: Vec<String>,
}

impl CMake {
    /// Out-of-tree build in `build/`, installed to `prefix`.
    pub fn new(prefix: &str) -> Self {
        Self {
            configure: strings(&["-B", BUILD_DIR]),
            build: strings(&["--build", BUILD_DIR]),
            install: strings(&["--install", BUILD_DIR, "--prefix", prefix]),
        }
    }

    pub fn define(&mut self, key: &str, value: &str) {
        self.configure.push(format!("-D{key}={value}"));
    }

    /// Job count and verbosity go to the build step only.
    pub fn tool_flags(&mut self, target: &Target) {
        self.build.extend(target.jobs_args());
        if target.verbose {
            self.build.push("--verbose".into());
        }
    }

    /// configure, build and install, each run in `dir`.
    pub fn steps(self, dir: &Path) -> Vec<Step> {
        [self.configure, self.build, self.install]
            .into_iter()
            .map(|args| Step::Run(Cmd::new("cmake").args(args).current_dir(dir)))
            .collect()
    }
}
