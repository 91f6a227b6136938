//! CLI, configuration, Google credential lifecycle, calendar query, output sink.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod google;
pub mod sink;
