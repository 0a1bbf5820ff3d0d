//! Configuration module for Campus-Archiver
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default; a file only needs to name what it changes.
//!
//! # Example
//!
//! ```no_run
//! use campus_archiver::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("archiver.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CrawlConfig, CrawlerConfig, OutputConfig, RenderConfig, RenderEngine, ScopeConfig,
};

// Re-export parser functions
pub use parser::{config_hash, load_config, parse_config, read_config};
pub use validation::validate;
