//! Data layer: table model, loading, date coercion, selections and export.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Table
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  model    │  Table = ordered Vec<Column>, CellValue cells
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  engine   │  classify → specs → filters → summaries
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  export   │  filtered Table → CSV
//!   └──────────┘
//! ```

pub mod dates;
pub mod export;
pub mod loader;
pub mod model;
pub mod selections;
