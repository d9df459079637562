//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use vier_core::Channel;

/// Browse the VIER, VIJF and ZES video catalogs and resolve playable streams.
///
/// Listing output and resolved stream URLs go to stdout; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "vier")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Channel to browse (vier, vijf, zes); overrides the config file
    #[arg(long, global = true)]
    pub channel: Option<Channel>,

    /// Proxy URL for all requests; overrides the config file
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List programs (main list) or the videos of a program page.
    List {
        /// Listing URL, absolute or site-relative; defaults to the program overview
        url: Option<String>,

        /// Number of pages to follow (1-100); defaults to the config value
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
        pages: Option<u32>,
    },

    /// Resolve a video page into its playable stream variants.
    Resolve {
        /// Video detail page URL, absolute or site-relative
        url: String,
    },

    /// Manage stored account credentials.
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthCommand {
    /// Store username and password (read from stdin) in the encrypted vault.
    Login,
    /// Delete the encrypted vault with all stored credentials and tokens.
    Clear,
}
