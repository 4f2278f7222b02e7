//! SlideKit Application
//!
//! Headless shell around the editor: opens a slide store directory and
//! replays an edit script against it.

mod app;
mod script;

pub use app::{App, AppConfig, AppError, run};
pub use script::{AnchorEnd, Command, Script};
