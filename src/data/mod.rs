/// Data layer: core types, loading, time normalization, and smoothing.
///
/// Architecture:
/// ```text
///  .xlsx / .ods / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<RawRow>
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  parse Time, drop bad rows → Dataset
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  smooth   │  centered rolling mean → Dataset (smoothed filled)
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod normalize;
pub mod smooth;
