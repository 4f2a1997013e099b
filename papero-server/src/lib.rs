//! Papero Server Library
//!
//! The remote library/content service the reading client talks to. Exported
//! for testing and reuse.

pub mod handlers;
pub mod routes;
pub mod state;
