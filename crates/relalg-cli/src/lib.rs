//! relalg CLI support
//!
//! Loads data files into a [`relalg::Catalog`] for the `relalg` binary.
//!
//! # Example
//!
//! ```ignore
//! use relalg_cli::loader;
//!
//! let catalog = loader::load_catalog(&["./data/".into()]);
//! let df = relalg::run("R join_ S", &catalog)?;
//! ```

pub mod loader;
