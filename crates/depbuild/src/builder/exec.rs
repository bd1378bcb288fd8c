//! Commands, build steps and the executor that runs them.
//!
//! Components never touch the filesystem or spawn processes themselves. They
//! return a list of [`Step`]s which the [`Executor`] carries out in order, so a
//! plan can be inspected (tests, `--dry-run`) without side effects.

use crate::builder::fsops;
use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// An external command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cmd {
    pub program: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
    pub ignore_error: bool,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: None,
            ignore_error: false,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Keep going when this command exits with a nonzero status.
    #[must_use]
    pub fn ignore_error(mut self) -> Self {
        self.ignore_error = true;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// One action of a build plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Progress message.
    Note(String),
    Run(Cmd),
    WriteFile { path: PathBuf, contents: String },
    RemoveFile(PathBuf),
    RemoveDir(PathBuf),
    /// Rename `lib<name>.a` to `<name>.lib` inside a directory (MSVC naming).
    RenameStaticLibs { lib_dir: PathBuf },
    /// Move `include/boost-<ver>/boost` up to `include/boost`.
    HoistBoostHeaders { include_dir: PathBuf },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Note(msg) => f.write_str(msg),
            Self::Run(cmd) => match &cmd.dir {
                Some(dir) => write!(f, "{cmd}    (in {})", dir.display()),
                None => write!(f, "{cmd}"),
            },
            Self::WriteFile { path, .. } => write!(f, "write {}", path.display()),
            Self::RemoveFile(path) => write!(f, "rm {}", path.display()),
            Self::RemoveDir(path) => write!(f, "rm -r {}", path.display()),
            Self::RenameStaticLibs { lib_dir } => {
                write!(f, "rename lib*.a -> *.lib in {}", lib_dir.display())
            }
            Self::HoistBoostHeaders { include_dir } => {
                write!(f, "move boost-*/boost -> boost in {}", include_dir.display())
            }
        }
    }
}

/// Runs commands and plan steps. In dry-run mode only read-only queries execute.
#[derive(Clone, Copy, Debug, Default)]
pub struct Executor {
    pub dry_run: bool,
}

impl Executor {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Echo and run a command, failing on nonzero exit unless it is ignorable.
    pub fn run(&self, cmd: &Cmd) -> Result<()> {
        info!(">>> {cmd}");
        if self.dry_run {
            return Ok(());
        }

        let status = cmd
            .command()
            .status()
            .with_context(|| format!("Failed to run {}", cmd.program))?;

        if !status.success() {
            if cmd.ignore_error {
                warn!("`{cmd}` failed ({status}), ignoring");
            } else {
                bail!("`{cmd}` failed ({status})");
            }
        }
        Ok(())
    }

    /// Run a read-only command and return its trimmed stdout. Runs even in dry-run mode.
    pub fn read_output(&self, cmd: &Cmd) -> Result<String> {
        debug!(">>> {cmd}");
        let output = cmd
            .command()
            .output()
            .with_context(|| format!("Failed to run {}", cmd.program))?;

        if !output.status.success() {
            bail!("`{cmd}` failed ({})", output.status);
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    /// Carry out a plan in order, stopping at the first failing step.
    pub fn execute(&self, steps: &[Step]) -> Result<()> {
        for step in steps {
            self.step(step)?;
        }
        Ok(())
    }

    fn step(&self, step: &Step) -> Result<()> {
        match step {
            Step::Note(msg) => {
                info!("{msg}");
                Ok(())
            }
            Step::Run(cmd) => self.run(cmd),
            Step::WriteFile { path, contents } => {
                info!("Writing {}", path.display());
                if self.dry_run {
                    return Ok(());
                }
                std::fs::write(path, contents)
                    .with_context(|| format!("Failed to write {}", path.display()))
            }
            Step::RemoveFile(path) => self.remove(path, false),
            Step::RemoveDir(path) => self.remove(path, true),
            Step::RenameStaticLibs { lib_dir } => {
                if self.dry_run {
                    info!("{step}");
                    return Ok(());
                }
                for (from, to) in fsops::rename_static_libs(lib_dir)? {
                    debug!("renamed {} -> {}", from.display(), to.display());
                }
                Ok(())
            }
            Step::HoistBoostHeaders { include_dir } => {
                if self.dry_run {
                    info!("{step}");
                    return Ok(());
                }
                if let Some((from, to)) = fsops::hoist_boost_headers(include_dir)? {
                    info!("moving {} to {}", from.display(), to.display());
                }
                Ok(())
            }
        }
    }

    fn remove(&self, path: &Path, dir: bool) -> Result<()> {
        if self.dry_run {
            debug!("would remove {}", path.display());
            return Ok(());
        }
        if !path.exists() {
            debug!("{} already gone", path.display());
            return Ok(());
        }
        let result = if dir {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        };
        result.with_context(|| format!("Failed to remove {}", path.display()))
    }
}
