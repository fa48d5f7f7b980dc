//! wcon-core: chained-file resolution and dataset I/O for WCON
//!
//! A WCON (Worm Tracker Commons) dataset may be split over several files that
//! point at each other through the `files` object of each document. This
//! crate reads and writes those files through a codec, derives the names of
//! neighbouring files, and walks whole chains.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use wcon_core::{ChainConfig, DatasetIo, JsonCodec, load_chain, next_file};
//!
//! fn main() -> Result<(), wcon_core::WconError> {
//!     let io = DatasetIo::new(JsonCodec::new());
//!     let path = Path::new("tracks/run_2.wcon");
//!
//!     let doc = io.read_dataset(path)?;
//!     if let Some(next) = next_file(path, &doc)? {
//!         println!("next file: {}", next.display());
//!     }
//!
//!     let chain = load_chain(&io, path, &ChainConfig::default())?;
//!     println!("{} file(s) in chain", chain.len());
//!     Ok(())
//! }
//! ```

pub mod chain;
pub mod codec;
pub mod config;
pub mod dataset_io;
pub mod document;
pub mod error;
pub mod safe_io;
pub mod traversal;

pub use chain::{WCON_EXTENSION, next_file, previous_file, resolve_adjacent};
pub use codec::{JsonCodec, WconCodec};
pub use config::ChainConfig;
pub use dataset_io::{DatasetIo, write_base_name};
pub use document::{Document, FileLinks};
pub use error::{Result, WconError};
pub use traversal::{ChainLink, load_chain};
