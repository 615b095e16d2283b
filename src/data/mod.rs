/// Data layer: core types, the query boundary and its file-backed source.
///
/// Architecture:
/// ```text
///  fixture .json ──► ┌─────────┐   SeriesQuery / RelationQuery
///                    │ fixture  │ ◄──────────────────────────── pipeline
///                    └─────────┘
///                         │ inline records or
///                         ▼ .json / .csv / .parquet
///                    ┌─────────┐
///                    │  loader  │  parse file → Vec<Observation>
///                    └─────────┘
/// ```

pub mod fixture;
pub mod loader;
pub mod model;
pub mod source;
