//! Component registry - single source of truth for all buildable components.

use super::{boost::Boost, ffmpeg::Ffmpeg, libwebp::Libwebp, sentry::Sentry, Buildable};

/// All registered components.
///
/// Order matters for `build_all`: FFmpeg links against the installed libwebp.
pub static COMPONENTS: &[&dyn Buildable] = &[&Libwebp, &Ffmpeg, &Sentry, &Boost];

/// Get component by name.
#[must_use]
pub fn get(name: &str) -> Option<&'static dyn Buildable> {
    COMPONENTS.iter().find(|c| c.name() == name).copied()
}

/// List all component names.
pub fn names() -> impl Iterator<Item = &'static str> {
    COMPONENTS.iter().map(|c| c.name())
}
