//! UPnP client for zone speakers: SOAP transport, DIDL-Lite metadata and
//! the typed [`Speaker`] facade built on both.

pub mod didl;
pub mod discovery;
pub mod soap;
pub mod speaker;

pub use speaker::{CurrentTrack, Speaker};
