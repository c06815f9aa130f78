/// Data layer: core types, loading, filtering and summaries.
///
/// Architecture:
/// ```text
///  .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → MeasurementTable (cached per path)
///   └──────────┘
///        │
///        ▼
///   ┌─────────────────┐
///   │ MeasurementTable │  categorical + narrowed numeric columns
///   └─────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSpec → row indices (cached per spec)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ summary   │  describe + search/paginate a view
///   └──────────┘
/// ```

pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod summary;
