//! metabolyx-cli — file-based front end for the ranking engine.
//!
//! Reads evidence tables from CSV/TSV, resolves the ranking configuration,
//! runs [`metabolyx_ranker::RankingEngine`] and writes the result tables.

pub mod cli;
pub mod commands;
pub mod report;
pub mod tables;

pub use cli::{Cli, Command};
