//! Dynamic filter inference for tabular inventory data.
//!
//! Given an arbitrary table, the engine decides per column which kind of
//! filter fits it (multi-select, numeric slider, date range or none), turns
//! user selections into active filters, applies them, and summarizes a fixed
//! set of key columns of the filtered view.
//!
//! ```no_run
//! use inventory_explorer::config::EngineConfig;
//! use inventory_explorer::data::loader::load_file;
//! use inventory_explorer::engine::{recompute, spec::Selections, summary::KeyColumns};
//!
//! # fn main() -> Result<(), inventory_explorer::error::ExplorerError> {
//! let table = load_file("inventario.csv".as_ref())?;
//! let out = recompute(&table, &KeyColumns::inventory(), &Selections::new(), &EngineConfig::default());
//! println!("{} filters, {} rows", out.specs.len(), out.filtered.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod state;
