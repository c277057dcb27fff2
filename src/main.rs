#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod constants;
mod deploy;
mod errors;
mod git;
mod locate;
mod manifest;
mod prompt;
mod scope;

fn main() -> Result<()> {
    cli::Cli::parse().init_tracing_subscriber()?.run()
}
