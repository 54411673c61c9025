//! Salotto Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod cli_style;
pub mod commands;
pub mod config;
pub mod device;
pub mod music_library;
pub mod session;
pub mod shell;

// Re-export commonly used types for convenience
pub use config::{AppConfig, CliConfig, FileConfig};
pub use music_library::{ItemType, LibraryError, MusicLibrary};
pub use session::Session;
