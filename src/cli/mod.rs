//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing, enums, and subcommand handlers.

mod args;
mod commands;
mod enums;

pub use args::{
    parse_cell_size, parse_framerate, parse_non_negative, parse_positive, parse_resolution,
    parse_sigma, parse_unit, Args, Command,
};
pub use commands::list_cameras;
pub use enums::{Backend, Color};
