//! matrix-silhouette library crate.
//!
//! Camera frames become an edge map, the edge map becomes a soft halo, and
//! the halo, sampled onto a character grid, lights up falling digital rain.
//!
//! The binary wires these together; the modules are public so each stage can
//! be driven on its own in tests.

pub mod camera;
pub mod cli;
pub mod compositor;
pub mod config;
pub mod error;
pub mod event_loop;
pub mod rain;
pub mod terminal;
pub mod vision;

pub use error::{RainError, Result};
