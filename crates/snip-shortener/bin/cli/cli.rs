use clap::{Parser, Subcommand, ValueEnum};
use snip_shortener::StoreArgs;

pub const LOG_FORMAT_ENV: &str = "SNIP_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "snip", about = "Operate a snip link store")]
pub struct CLI {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shorten one or more URLs for an owner.
    Shorten {
        #[arg(long)]
        owner: String,
        /// Prefix printed codes with this base URL.
        #[arg(long)]
        base_url: Option<String>,
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Print the URL behind a code.
    Resolve { code: String },
    /// List an owner's links.
    List {
        #[arg(long)]
        owner: String,
        /// Also print soft-deleted links.
        #[arg(long)]
        include_deleted: bool,
    },
    /// Soft-delete codes held by an owner.
    Delete {
        #[arg(long)]
        owner: String,
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Check that the storage backend is reachable.
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;
    use snip_shortener::StorageBackendArg;
    use std::path::PathBuf;

    #[test]
    fn storage_flags_are_accepted_after_the_subcommand() {
        let cli = CLI::try_parse_from([
            "snip",
            "shorten",
            "--storage",
            "file",
            "--file-storage-path",
            "links.json",
            "--owner",
            "u1",
            "https://example.com",
        ])
        .unwrap();

        assert_eq!(cli.store.storage, Some(StorageBackendArg::File));
        assert_eq!(cli.store.file_storage_path, Some(PathBuf::from("links.json")));
        assert!(matches!(cli.command, Command::Shorten { ref owner, .. } if owner == "u1"));
    }

    #[test]
    fn storage_flags_are_accepted_before_the_subcommand() {
        let cli = CLI::try_parse_from(["snip", "--storage", "volatile", "ping"]).unwrap();

        assert_eq!(cli.store.storage, Some(StorageBackendArg::Volatile));
        assert!(matches!(cli.command, Command::Ping));
    }
}
