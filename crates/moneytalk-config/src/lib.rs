//! Configuration for the money conversation journal.
//!
//! Provides TOML-based configuration with:
//! - Sections for storage, logging, reports and the remote lookup
//! - Config file layering (user config + project-local overrides)
//! - The remote target-URL lookup performed at startup
//!
//! ```toml
//! [storage]
//! db_path = "/home/dana/journal.db"
//!
//! [report]
//! author = "Dana"
//! ```

pub mod discovery;
pub mod error;
pub mod remote;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, config_dir, load_config, load_config_file,
    load_config_with_options, log_dir, save_config, user_config_path,
};
pub use error::{ConfigError, Result};
pub use remote::{HttpRemoteConfig, RemoteConfigSource, Retrieval, RetrievalState};
pub use types::*;
