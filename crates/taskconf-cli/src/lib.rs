//! taskconf CLI library
//!
//! Exposes the CLI entry point and the helpers behind its commands so they
//! can be reused and tested without spawning the binary.

mod cli;

pub use cli::{
    build_lookup, check_config, parse_assignment, render, run, CliLookup, Finding, OutputFormat,
};
