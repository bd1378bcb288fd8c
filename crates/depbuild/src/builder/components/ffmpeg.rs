//! FFmpeg: a minimal static build with the webp/mjpeg codecs and screen-capture input devices.

use super::{strings, Buildable};
use crate::builder::context::Context;
use crate::builder::exec::{Cmd, Step};
use crate::builder::target::Target;
use anyhow::{bail, Result};

pub struct Ffmpeg;

const BASE_FLAGS: &[&str] = &[
    "--enable-static",
    "--enable-libwebp",
    "--disable-shared",
    "--disable-debug",
    "--disable-programs",
    "--disable-sdl2",
    "--disable-securetransport",
    "--disable-bzlib",
    "--disable-xlib",
    "--disable-zlib",
    "--disable-lzma",
    "--disable-iconv",
    "--disable-doc",
    "--disable-everything",
    "--enable-encoder=libwebp,mjpeg",
    "--enable-decoder=webp,rawvideo",
    "--enable-parser=mjpeg,webp",
    "--enable-muxer=mjpeg,webp",
    "--enable-indev=avfoundation,gdigrab",
];

impl Ffmpeg {
    /// Arguments for `sh configure`.
    pub fn configure_args(ctx: &Context) -> Result<Vec<String>> {
        let target = &ctx.target;
        let inst = ctx.inst();

        let mut args = vec![format!("--prefix={inst}"), format!("--arch={}", target.arch)];
        args.extend(strings(BASE_FLAGS));

        if target.is_windows() {
            if !ctx.is_msys() {
                bail!("FFmpeg must be built under MSYS2 on windows");
            }
            args.extend(strings(&[
                "--toolchain=msvc",
                "--target-os=win64",
                "--enable-w32threads",
            ]));
            args.push(format!("--extra-cflags=-I{inst}/include"));
            args.push(format!("--extra-ldflags=-L{inst}/lib"));
        } else if target.is_macos() {
            args.push("--disable-libxcb".into());
            if ctx.is_cross_compilation() {
                args.push("--enable-cross-compile".into());
            }
            if target.macos_target == "10.7" {
                args.push("--disable-videotoolbox".into());
            }

            let common = format!(
                "-isysroot {} -mmacosx-version-min={} -arch {}",
                ctx.sysroot()?.display(),
                target.macos_target,
                target.arch
            );
            args.push(format!("--extra-cflags={common} -I{inst}/include"));
            args.push(format!("--extra-ldflags={common} -L{inst}/lib"));
        } else {
            args.extend(strings(&["--enable-pic", "--disable-asm"]));
            args.push(format!("--extra-cflags=-I{inst}/include"));
        }

        Ok(args)
    }
}

impl Buildable for Ffmpeg {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn source_dir(&self) -> &'static str {
        "FFmpeg"
    }

    fn installed_marker(&self, target: &Target) -> &'static str {
        if target.is_windows() {
            "lib/avcodec.lib"
        } else {
            "lib/libavcodec.a"
        }
    }

    fn plan(&self, ctx: &Context) -> Result<Vec<Step>> {
        let src = ctx.source_dir(self.source_dir());
        let make = || Cmd::new("make").current_dir(&src);

        let mut steps = vec![
            Step::Run(
                Cmd::new("sh")
                    .arg("configure")
                    .args(Self::configure_args(ctx)?)
                    .current_dir(&src),
            ),
            Step::Run(make().args(ctx.target.jobs_args())),
            Step::Run(make().arg("install")),
            Step::Run(make().args(["clean", "distclean"])),
        ];

        if ctx.target.is_windows() {
            steps.push(Step::RenameStaticLibs {
                lib_dir: ctx.install_dir.join("lib"),
            });
        }
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

    fn mac(arch: &str, macos_target: &str, host: &str) -> Context {
        let target = Target::new(Platform::MacOs, arch).macos_target(macos_target);
        let tc = MacToolchain::for_target(&target.macos_target).unwrap();
        ctx(target).toolchain(tc).host_arch(host)
    }

    fn has(args: &[String], flag: &str) -> bool {
        args.iter().any(|a| a == flag)
    }

    #[test]
    fn test_common_flags_lead() {
        let args = Ffmpeg::configure_args(&ctx(Target::new(Platform::Linux, "x86_64"))).unwrap();
        assert_eq!(args[0], "--prefix=/w/linux-x86_64");
        assert_eq!(args[1], "--arch=x86_64");
        assert_eq!(args[2..2 + BASE_FLAGS.len()], *BASE_FLAGS);
    }

    #[test]
    fn test_linux_flags() {
        let args = Ffmpeg::configure_args(&ctx(Target::new(Platform::Linux, "x86_64"))).unwrap();
        assert!(has(&args, "--enable-pic"));
        assert!(has(&args, "--disable-asm"));
        assert!(has(&args, "--extra-cflags=-I/w/linux-x86_64/include"));
        assert!(!args.iter().any(|a| a.starts_with("--extra-ldflags")));
    }

    #[test]
    fn test_windows_requires_msys() {
        let err = Ffmpeg::configure_args(&ctx(Target::new(Platform::Windows, "x86_64")))
            .unwrap_err();
        assert_eq!(err.to_string(), "FFmpeg must be built under MSYS2 on windows");
    }

    #[test]
    fn test_windows_flags_under_msys() {
        let c = ctx(Target::new(Platform::Windows, "x86_64")).msystem("MSYS");
        let args = Ffmpeg::configure_args(&c).unwrap();
        assert!(has(&args, "--toolchain=msvc"));
        assert!(has(&args, "--target-os=win64"));
        assert!(has(&args, "--enable-w32threads"));
        assert!(has(&args, "--extra-cflags=-I/w/windows-x86_64/include"));
        assert!(has(&args, "--extra-ldflags=-L/w/windows-x86_64/lib"));
    }

    #[test]
    fn test_windows_plan_renames_libs_last() {
        let c = ctx(Target::new(Platform::Windows, "x86_64")).msystem("MSYS");
        let steps = Ffmpeg.plan(&c).unwrap();
        assert_eq!(
            steps.last(),
            Some(&Step::RenameStaticLibs {
                lib_dir: "/w/windows-x86_64/lib".into()
            })
        );
    }

    #[test]
    fn test_macos_native_flags() {
        let args = Ffmpeg::configure_args(&mac("x86_64", "10.8", "x86_64")).unwrap();
        let sysroot = "/Library/Developer/10/CommandLineTools/SDKs/MacOSX10.14.sdk";
        assert!(has(&args, "--disable-libxcb"));
        assert!(!has(&args, "--enable-cross-compile"));
        assert!(!has(&args, "--disable-videotoolbox"));
        assert!(has(
            &args,
            &format!(
                "--extra-cflags=-isysroot {sysroot} -mmacosx-version-min=10.8 -arch x86_64 \
                 -I/w/macos-10.8-x86_64/include"
            )
        ));
        assert!(has(
            &args,
            &format!(
                "--extra-ldflags=-isysroot {sysroot} -mmacosx-version-min=10.8 -arch x86_64 \
                 -L/w/macos-10.8-x86_64/lib"
            )
        ));
    }

    #[test]
    fn test_macos_cross_compile_to_arm64() {
        let args = Ffmpeg::configure_args(&mac("arm64", "10.8", "x86_64")).unwrap();
        assert!(has(&args, "--enable-cross-compile"));
        assert!(args
            .iter()
            .any(|a| a.contains("-mmacosx-version-min=11.1 -arch arm64")));
    }

    #[test]
    fn test_lion_disables_videotoolbox() {
        let args = Ffmpeg::configure_args(&mac("x86_64", "10.7", "x86_64")).unwrap();
        assert!(has(&args, "--disable-videotoolbox"));
    }

    #[test]
    fn test_make_sequence() {
        let target = Target::new(Platform::Linux, "x86_64").jobs(6);
        let steps = Ffmpeg.plan(&ctx(target)).unwrap();
        let lines: Vec<String> = steps
            .iter()
            .skip(1)
            .map(|s| match s {
                Step::Run(cmd) => cmd.to_string(),
                other => other.to_string(),
            })
            .collect();
        assert_eq!(
            lines,
            ["make -j 6", "make install", "make clean distclean"]
        );
    }
}
