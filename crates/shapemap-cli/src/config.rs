//! Command-line arguments and demo configuration.

use crate::formatter::OutputFormat;
use clap::{Parser, ValueEnum};
use shapemap_core::StorageConfig;
use std::path::PathBuf;

/// Default directory for the sled store.
pub const DEFAULT_DATA_PATH: &str = "./shapemap_data";

/// Storage collaborator backing the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// On-disk sled store
    Sled,
    /// In-process memory store
    Memory,
}

/// Resolved demo configuration.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub backend: Backend,
    pub storage: StorageConfig,
    /// Keep rows written by earlier runs.
    pub keep_data: bool,
    pub format: OutputFormat,
}

/// Command-line arguments for the demo.
#[derive(Parser, Debug)]
#[command(name = "shapemap")]
#[command(version, about = "Runtime shapes mapped onto storage", long_about = None)]
pub struct Args {
    /// Path to the database storage directory.
    #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
    pub data_path: PathBuf,

    /// Use a temporary sled database, removed on exit.
    #[arg(long)]
    pub temporary: bool,

    /// Storage backend.
    #[arg(long, default_value = "sled", value_enum)]
    pub backend: Backend,

    /// Keep existing data instead of recreating the store.
    #[arg(long)]
    pub keep_data: bool,

    /// Reject models whose foreign keys match no parent.
    #[arg(long)]
    pub enforce_foreign_keys: bool,

    /// Output format.
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,
}

impl Args {
    /// Convert command-line arguments to demo configuration.
    pub fn into_config(self) -> DemoConfig {
        let storage = if self.temporary {
            StorageConfig::temporary()
        } else {
            StorageConfig::new(self.data_path)
        }
        .with_foreign_keys(self.enforce_foreign_keys);

        DemoConfig {
            backend: self.backend,
            storage,
            keep_data: self.keep_data,
            format: self.format,
        }
    }
}
