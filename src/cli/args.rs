//! CLI argument definitions using clap
//!
//! Every command opens the store named by `--config`, runs one operation
//! and prints one JSON response line. `create` and `update` read their
//! document from stdin.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// postline - per-user post storage
#[derive(Parser, Debug)]
#[command(name = "postline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./postline.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a post from a draft JSON on stdin
    Create,

    /// Fetch one post
    Get { id: u64 },

    /// Replace a post from post JSON on stdin
    Update,

    /// Delete one post
    Delete { id: u64 },

    /// Re-post an existing post to another URL
    Share {
        id: u64,
        /// Where the post is being shared to
        target: String,
    },

    /// One page of all posts, newest first
    List {
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Every post id, newest first
    Ids,

    /// One page of public posts, newest first
    Recent {
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// One public post
    Public { id: u64 },

    /// Follow a feed URL
    Subscribe { url: String },

    /// Stop following a feed URL
    Unsubscribe { url: String },

    /// List followed feed URLs
    Subscriptions,

    /// Fetch recent posts of a followed feed
    Feed { url: String },

    /// Delete every post, index and subscription of the configured user
    Flush {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_share() {
        let cli = Cli::try_parse_from(["postline", "share", "3", "http://b.example/"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Share {
                id: 3,
                target: "http://b.example/".into()
            }
        );
        assert_eq!(cli.config, PathBuf::from("./postline.json"));
    }

    #[test]
    fn test_parse_global_config_and_offset() {
        let cli =
            Cli::try_parse_from(["postline", "list", "--offset", "20", "--config", "/etc/p.json"])
                .unwrap();
        assert_eq!(cli.command, Command::List { offset: 20 });
        assert_eq!(cli.config, PathBuf::from("/etc/p.json"));
    }

    #[test]
    fn test_flush_defaults_to_unconfirmed() {
        let cli = Cli::try_parse_from(["postline", "flush"]).unwrap();
        assert_eq!(cli.command, Command::Flush { yes: false });
    }

    #[test]
    fn test_rejects_non_numeric_id() {
        assert!(Cli::try_parse_from(["postline", "get", "abc"]).is_err());
    }
}
