//! sentry-native with the crashpad backend.

use super::cmake::{CMake, BUILD_DIR};
use super::Buildable;
use crate::builder::context::Context;
use crate::builder::exec::{Cmd, Step};
use crate::builder::target::Target;
use anyhow::{bail, Result};

pub struct Sentry;

const BUILD_TYPE: &str = "RelWithDebInfo";

/// Present once the crashpad submodule is checked out.
const CRASHPAD_MARKER: &str = "external/crashpad/CMakeLists.txt";

impl Buildable for Sentry {
    fn name(&self) -> &'static str {
        "sentry"
    }

    fn source_dir(&self) -> &'static str {
        "sentry-native"
    }

    fn installed_marker(&self, _target: &Target) -> &'static str {
        "include/sentry.h"
    }

    fn plan(&self, ctx: &Context) -> Result<Vec<Step>> {
        let target = &ctx.target;
        let src = ctx.source_dir(self.source_dir());
        let mut cmake = CMake::new(&ctx.inst());
        let mut steps = Vec::new();

        if target.is_windows() && ctx.is_msys() {
            bail!("Sentry cannot be built under MSYS2 on windows");
        }

        if !src.join(CRASHPAD_MARKER).is_file() {
            steps.push(Step::Note("Pulling crashpad...".into()));
            steps.push(Step::Run(
                Cmd::new("git")
                    .args(["submodule", "update", "--init", "--recursive"])
                    .current_dir(&src),
            ));
        }

        if target.is_windows() {
            cmake.define("SENTRY_BUILD_RUNTIMESTATIC", "ON");
            for args in [&mut cmake.build, &mut cmake.install] {
                args.extend(["--config".to_string(), BUILD_TYPE.to_string()]);
            }
        } else {
            cmake.define("CMAKE_BUILD_TYPE", BUILD_TYPE);
        }

        if target.is_macos() {
            cmake.define("CMAKE_OSX_ARCHITECTURES", &target.arch);
            cmake.define("CMAKE_OSX_DEPLOYMENT_TARGET", &target.macos_target);
            if matches!(target.macos_target.as_str(), "10.7" | "10.8") {
                cmake.define("CMAKE_CXX_FLAGS", "-stdlib=libc++");
            }
        }

        cmake.define("SENTRY_BUILD_SHARED_LIBS", "OFF");
        cmake.define("SENTRY_BACKEND", "crashpad");
        cmake.define("SENTRY_BUILD_TESTS", "OFF");
        cmake.define("SENTRY_BUILD_EXAMPLES", "OFF");
        cmake.tool_flags(target);

        steps.extend(cmake.steps(&src));
        steps.push(Step::RemoveDir(src.join(BUILD_DIR)));
        Ok(steps)
    }
}
