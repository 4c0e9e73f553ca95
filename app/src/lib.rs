//! # Prism App
//!
//! Startup for the Prism viewer: command line and configuration, HDR and
//! material loading, the lighting bake and the viewer [`Session`].
//!
//! ## Overview
//!
//! - [`Args`] - Command line flags
//! - [`Config`] - Optional TOML file, overridden by the flags
//! - [`App`] - Runs the bake and simulates frames, returning a [`RunSummary`]
//! - [`Session`] - Camera, selection and per-frame [`FrameState`]
//!
//! ## Example
//!
//! ```ignore
//! use clap::Parser;
//! use prism_app::{App, Args, Config};
//!
//! let args = Args::parse();
//! let summary = App::new(Config::resolve(&args)?).run()?;
//! println!("{summary}");
//! ```

mod app;
mod args;
pub mod assets;
mod config;
mod error;
mod session;

pub use app::{App, RunSummary};
pub use args::{Args, CliBackend};
pub use config::{Config, DEFAULT_FRAMES, IblConfig};
pub use error::AppError;
pub use session::{FrameState, InputEvent, Session};

/// App library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the app subsystem.
pub fn init() {
    prism_graphics::init();
    log::info!("Prism App v{} initialized", VERSION);
}
