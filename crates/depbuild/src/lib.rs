//! Builds third-party libraries (libwebp, FFmpeg, sentry-native, Boost) with
//! their own build systems and installs them into a per-platform directory.
//!
//! Components describe their build as a list of [`builder::exec::Step`]s; the
//! [`builder::exec::Executor`] runs them, or only prints them in dry-run mode.

pub mod builder;
