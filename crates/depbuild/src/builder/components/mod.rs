//! Buildable dependencies.
//!
//! Each module turns a [`Context`] into the list of steps that configure,
//! build and install one third-party library.

pub mod boost;
mod cmake;
pub mod ffmpeg;
pub mod libwebp;
pub mod registry;
pub mod sentry;

use crate::builder::context::Context;
use crate::builder::exec::Step;
use crate::builder::target::Target;
use anyhow::Result;

/// A third-party library built from a checkout under the repos dir.
pub trait Buildable: Sync {
    /// CLI name of the component.
    fn name(&self) -> &'static str;

    /// Checkout directory name below the repos dir.
    fn source_dir(&self) -> &'static str;

    /// File below the install dir that exists once the component is installed.
    fn installed_marker(&self, target: &Target) -> &'static str;

    /// Steps that build and install the component.
    fn plan(&self, ctx: &Context) -> Result<Vec<Step>>;
}

/// Owned copies of a flag list.
fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(ToString::to_string).collect()
}
