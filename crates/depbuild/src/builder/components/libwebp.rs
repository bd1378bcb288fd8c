//! libwebp: only the codec libraries, none of the command line tools.

use super::cmake::{CMake, BUILD_DIR};
use super::Buildable;
use crate::builder::context::Context;
use crate::builder::exec::Step;
use crate::builder::target::Target;
use anyhow::Result;

pub struct Libwebp;

const DISABLED: &[&str] = &[
    "WEBP_BUILD_GIF2WEBP",
    "WEBP_BUILD_ANIM_UTILS",
    "WEBP_BUILD_CWEBP",
    "WEBP_BUILD_DWEBP",
    "WEBP_BUILD_IMG2WEBP",
    "WEBP_BUILD_VWEBP",
    "WEBP_BUILD_WEBPINFO",
    "WEBP_BUILD_WEBPMUX",
    "WEBP_BUILD_EXTRAS",
    "WEBP_BUILD_WEBP_JS",
];

const TARGETS: &[&str] = &["webp", "libwebpmux", "webpdemux", "webpdecoder"];

/// Forces the static MSVC runtime.
const USER_RULES: &str = "user.cmake";
const USER_RULES_CONTENTS: &str = "add_definitions(/MT)\n";

impl Buildable for Libwebp {
    fn name(&self) -> &'static str {
        "libwebp"
    }

    fn source_dir(&self) -> &'static str {
        "libwebp"
    }

    fn installed_marker(&self, target: &Target) -> &'static str {
        if target.is_windows() {
            "lib/webp.lib"
        } else {
            "lib/libwebp.a"
        }
    }

    fn plan(&self, ctx: &Context) -> Result<Vec<Step>> {
        let target = &ctx.target;
        let src = ctx.source_dir(self.source_dir());
        let mut cmake = CMake::new(&ctx.inst());
        let mut steps = Vec::new();

        for option in DISABLED {
            cmake.define(option, "OFF");
        }
        for name in TARGETS {
            cmake.build.extend(["--target".to_string(), (*name).to_string()]);
        }

        if target.is_windows() {
            steps.push(Step::WriteFile {
                path: src.join(USER_RULES),
                contents: USER_RULES_CONTENTS.to_string(),
            });
            cmake.define("CMAKE_USER_MAKE_RULES_OVERRIDE", USER_RULES);
            cmake.build.extend(["--config".to_string(), "Release".to_string()]);
        } else {
            cmake.define("CMAKE_BUILD_TYPE", "Release");
        }

        if target.is_macos() {
            cmake.define("CMAKE_OSX_ARCHITECTURES", &target.arch);
            cmake.define("CMAKE_OSX_DEPLOYMENT_TARGET", &target.macos_target);
        }

        cmake.tool_flags(target);

        steps.extend(cmake.steps(&src));
        steps.push(Step::RemoveDir(src.join(BUILD_DIR)));
        if target.is_windows() {
            steps.push(Step::RemoveFile(src.join(USER_RULES)));
        }
        Ok(steps)
    }
}
