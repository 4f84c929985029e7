/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file, normalise headers → RecordStore
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ RecordStore  │  Vec<Record>, declared columns, distinct values
///   └─────────────┘
///        │  FilterCriteria
///        ▼
///   ┌──────────┐
///   │  filter   │  per-column predicates → filtered rows
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌───────────┐  ┌────────┐
///   │ aggregate  │  │  geo    │  map markers from "lat,lon" text
///   └───────────┘  └────────┘
/// ```

pub mod aggregate;
pub mod boundary;
pub mod filter;
pub mod geo;
pub mod loader;
pub mod model;
pub mod store;

pub use aggregate::Aggregation;
pub use filter::{Criterion, FilterCriteria};
pub use model::{Record, Value};
pub use store::{LoadState, RecordStore, StoreError};
