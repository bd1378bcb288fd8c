//! Boost via `bootstrap` + `b2`, static libraries with a static runtime.

use super::{strings, Buildable};
use crate::builder::context::Context;
use crate::builder::exec::{Cmd, Step};
use crate::builder::target::Target;
use anyhow::Result;

pub struct Boost;

const USER_CONFIG: &str = "user-config.jam";
const BUILD_DIR: &str = "build";

/// Present once the library submodules are checked out.
const SUBMODULE_MARKER: &str = "libs/any/.git";

/// A Boost.Build toolset declaration for `user-config.jam`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toolset {
    pub base: &'static str,
    pub compiler: String,
    /// Feature name -> values, in declaration order.
    pub properties: Vec<(&'static str, Vec<String>)>,
}

impl Toolset {
    fn new(base: &'static str, compiler: String) -> Self {
        Self {
            base,
            compiler,
            properties: vec![
                ("cxxstd", strings(&["14"])),
                ("architecture", strings(&["x86"])),
                ("address-model", strings(&["64"])),
            ],
        }
    }

    /// Set a property, keeping its original position when it already exists.
    fn set(&mut self, key: &'static str, values: Vec<String>) {
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = values,
            None => self.properties.push((key, values)),
        }
    }

    fn append(&mut self, key: &'static str, values: &[&str]) {
        if let Some((_, existing)) = self.properties.iter_mut().find(|(k, _)| *k == key) {
            existing.extend(strings(values));
        } else {
            self.set(key, strings(values));
        }
    }

    pub fn for_context(ctx: &Context) -> Result<Self> {
        let target = &ctx.target;

        if target.is_windows() {
            let mut toolset = Self::new("msvc", String::new());
            toolset.set("target-os", strings(&["windows"]));
            return Ok(toolset);
        }

        let compiler = ctx.cxx_compiler()?.display().to_string();

        if target.is_linux() {
            let mut toolset = Self::new("gcc", compiler);
            toolset.set("target-os", strings(&["linux"]));
            return Ok(toolset);
        }

        let sysroot = ctx.sysroot()?.display().to_string();
        let min_version = format!("-mmacosx-version-min={}", target.macos_target);

        let mut toolset = Self::new("clang", compiler);
        toolset.set("cxxflags", strings(&["-stdlib=libc++", "-std=c++14"]));
        toolset.set("target-os", strings(&["darwin"]));
        toolset.set(
            "compileflags",
            vec![
                format!("-isysroot {sysroot}"),
                min_version.clone(),
                format!("-arch {}", target.arch),
            ],
        );
        toolset.set("linkflags", vec![format!("-isysroot {sysroot}"), min_version]);

        if target.arch == "arm64" {
            toolset.set("architecture", strings(&["arm"]));
            toolset.append(
                "compileflags",
                &["-DBOOST_AC_USE_PTHREADS", "-DBOOST_SP_USE_PTHREADS"],
            );
            toolset.set("abi", strings(&["aapcs"]));
            toolset.set("binary-format", strings(&["mach-o"]));
        }
        Ok(toolset)
    }

    /// Contents of `user-config.jam`.
    pub fn render(&self) -> String {
        let mut out = format!("using {} : : {} :\n", self.base, self.compiler);
        for (key, values) in &self.properties {
            let joined = values.join(" ");
            let quoted = values.len() > 1 || joined.contains(' ');
            if quoted {
                out.push_str(&format!("  <{key}>\"{joined}\"\n"));
            } else {
                out.push_str(&format!("  <{key}>{joined}\n"));
            }
        }
        out.push_str(";\n");
        out
    }
}

impl Boost {
    fn bootstrap(ctx: &Context) -> Cmd {
        let cmd = if ctx.target.is_windows() {
            Cmd::new("cmd").args(["/C", "bootstrap.bat"])
        } else {
            Cmd::new("sh").arg("bootstrap.sh")
        };

        let cmd = cmd.arg(format!("--prefix={}", ctx.inst()));
        if ctx.target.is_macos() && ctx.target.arch == "arm64" {
            cmd.arg("--without-libraries=coroutine,fiber,context")
        } else {
            cmd
        }
    }

    /// The `b2` built by bootstrap, inside the source tree.
    fn b2(ctx: &Context) -> Cmd {
        let exe = if ctx.target.is_windows() { "b2.exe" } else { "b2" };
        let src = ctx.source_dir(Boost.source_dir());
        Cmd::new(src.join(exe).display().to_string()).current_dir(src)
    }

    pub fn b2_args(ctx: &Context, toolset: &Toolset) -> Vec<String> {
        let target = &ctx.target;
        let mut args = vec![
            format!("--build-dir={BUILD_DIR}"),
            format!("--user-config={USER_CONFIG}"),
            "-a".to_string(),
            "-q".to_string(),
        ];
        if target.jobs > 0 {
            args.push(format!("-j{}", target.jobs));
        }
        if target.verbose {
            args.push("-d+2".into());
        }
        args.extend(strings(&[
            "variant=release",
            "link=static",
            "runtime-link=static",
            "threading=multi",
        ]));
        args.push(format!("toolset={}", toolset.base));
        args.push("install".into());
        args.push(format!("--prefix={}", ctx.inst()));
        args
    }
}

impl Buildable for Boost {
    fn name(&self) -> &'static str {
        "boost"
    }

    fn source_dir(&self) -> &'static str {
        "boost"
    }

    fn installed_marker(&self, _target: &Target) -> &'static str {
        "include/boost/version.hpp"
    }

    fn plan(&self, ctx: &Context) -> Result<Vec<Step>> {
        let src = ctx.source_dir(self.source_dir());
        let toolset = Toolset::for_context(ctx)?;
        let mut steps = Vec::new();

        if !src.join(SUBMODULE_MARKER).exists() {
            steps.push(Step::Note("Pulling libraries...".into()));
            steps.push(Step::Run(
                Cmd::new("git")
                    .args(["submodule", "update", "--init", "--recursive"])
                    .current_dir(&src),
            ));
        }

        steps.push(Step::WriteFile {
            path: src.join(USER_CONFIG),
            contents: toolset.render(),
        });
        steps.push(Step::Run(Self::bootstrap(ctx).current_dir(&src)));
        steps.push(Step::Run(Self::b2(ctx).args(Self::b2_args(ctx, &toolset))));
        steps.push(Step::HoistBoostHeaders {
            include_dir: ctx.install_dir.join("include"),
        });
        steps.push(Step::Run(Self::b2(ctx).args(["--clean", "release"])));
        steps.push(Step::RemoveDir(src.join(BUILD_DIR)));
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::target::Platform;
    use crate::builder::toolchain::MacToolchain;
    use std::path::Path;

    fn ctx(target: Target) -> Context {
        Context::new(target, "/w/repos", Path::new("/w"))
    }

    fn mac(arch: &str) -> Context {
        let target = Target::new(Platform::MacOs, arch);
        let tc = MacToolchain::for_target(&target.macos_target).unwrap();
        ctx(target).toolchain(tc).cxx("/usr/bin/clang++")
    }

    #[test]
    fn test_linux_user_config() {
        let c = ctx(Target::new(Platform::Linux, "x86_64")).cxx("/usr/bin/g++");
        let toolset = Toolset::for_context(&c).unwrap();
        assert_eq!(
            toolset.render(),
            "using gcc : : /usr/bin/g++ :\n\
             \x20 <cxxstd>14\n\
             \x20 <architecture>x86\n\
             \x20 <address-model>64\n\
             \x20 <target-os>linux\n\
             ;\n"
        );
    }

    #[test]
    fn test_windows_user_config_has_no_compiler() {
        let toolset = Toolset::for_context(&ctx(Target::new(Platform::Windows, "x86_64"))).unwrap();
        let jam = toolset.render();
        assert!(jam.starts_with("using msvc : :  :\n"));
        assert!(jam.contains("  <target-os>windows\n"));
    }

    #[test]
    fn test_linux_without_compiler_fails() {
        let err = Toolset::for_context(&ctx(Target::new(Platform::Linux, "x86_64"))).unwrap_err();
        assert!(err.to_string().contains("C++ compiler"));
    }

    #[test]
    fn test_macos_user_config_quotes_multi_value_flags() {
        let jam = Toolset::for_context(&mac("x86_64")).unwrap().render();
        let sysroot = "/Library/Developer/10/CommandLineTools/SDKs/MacOSX10.14.sdk";
        assert!(jam.starts_with("using clang : : /usr/bin/clang++ :\n"));
        assert!(jam.contains("  <cxxflags>\"-stdlib=libc++ -std=c++14\"\n"));
        assert!(jam.contains("  <target-os>darwin\n"));
        assert!(jam.contains(&format!(
            "  <compileflags>\"-isysroot {sysroot} -mmacosx-version-min=10.8 -arch x86_64\"\n"
        )));
        assert!(jam.contains(&format!(
            "  <linkflags>\"-isysroot {sysroot} -mmacosx-version-min=10.8\"\n"
        )));
    }

    #[test]
    fn test_macos_arm64_toolset() {
        let toolset = Toolset::for_context(&mac("arm64")).unwrap();
        let keys: Vec<_> = toolset.properties.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            [
                "cxxstd",
                "architecture",
                "address-model",
                "cxxflags",
                "target-os",
                "compileflags",
                "linkflags",
                "abi",
                "binary-format"
            ]
        );

        let jam = toolset.render();
        assert!(jam.contains("  <architecture>arm\n"));
        assert!(jam.contains("  <abi>aapcs\n"));
        assert!(jam.contains("  <binary-format>mach-o\n"));
        assert!(jam.contains("-arch arm64 -DBOOST_AC_USE_PTHREADS -DBOOST_SP_USE_PTHREADS\"\n"));
    }

    #[test]
    fn test_bootstrap_command_per_platform() {
        let linux = Boost::bootstrap(&ctx(Target::new(Platform::Linux, "x86_64")));
        assert_eq!(linux.to_string(), "sh bootstrap.sh --prefix=/w/linux-x86_64");

        let windows = Boost::bootstrap(&ctx(Target::new(Platform::Windows, "x86_64")));
        assert_eq!(
            windows.to_string(),
            "cmd /C bootstrap.bat --prefix=/w/windows-x86_64"
        );

        let arm = Boost::bootstrap(&mac("arm64"));
        assert_eq!(
            arm.args.last().map(String::as_str),
            Some("--without-libraries=coroutine,fiber,context")
        );
    }

    #[test]
    fn test_b2_args() {
        let target = Target::new(Platform::Linux, "x86_64").jobs(8).verbose(true);
        let c = ctx(target).cxx("/usr/bin/g++");
        let toolset = Toolset::for_context(&c).unwrap();
        assert_eq!(
            Boost::b2_args(&c, &toolset),
            [
                "--build-dir=build",
                "--user-config=user-config.jam",
                "-a",
                "-q",
                "-j8",
                "-d+2",
                "variant=release",
                "link=static",
                "runtime-link=static",
                "threading=multi",
                "toolset=gcc",
                "install",
                "--prefix=/w/linux-x86_64",
            ]
        );
    }

    #[test]
    fn test_plan_order() {
        let c = ctx(Target::new(Platform::Linux, "x86_64")).cxx("/usr/bin/g++");
        let steps = Boost.plan(&c).unwrap();

        // submodules missing under /w/repos
        assert_eq!(steps[0], Step::Note("Pulling libraries...".into()));
        assert!(matches!(
            &steps[2],
            Step::WriteFile { path, .. } if path.ends_with("boost/user-config.jam")
        ));
        assert!(matches!(&steps[3], Step::Run(cmd) if cmd.program == "sh"));
        assert!(matches!(&steps[4], Step::Run(cmd) if cmd.program == "/w/repos/boost/b2"));
        assert_eq!(
            steps[5],
            Step::HoistBoostHeaders {
                include_dir: "/w/linux-x86_64/include".into()
            }
        );
        assert!(matches!(&steps[6], Step::Run(cmd) if cmd.args == ["--clean", "release"]));
        assert_eq!(steps[7], Step::RemoveDir("/w/repos/boost/build".into()));
        assert_eq!(steps.len(), 8);
    }
}
