//! # IO Module
//!
//! Interface layer exposing the domain services. The only surface is the
//! command line: argument parsing, command dispatch and text rendering.

pub mod cli;

pub use cli::*;
