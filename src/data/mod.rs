/// Data layer: core types, loading, and structure lookup.
///
/// Architecture:
/// ```text
///  SAUVW_full_crysdata.csv / SAUVW_Benchmark.csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table (typed columns)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  ordered columns, ordered rows
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  locate   │  id / availability columns → eligible ids → <id>.cif path
///   └──────────┘
/// ```

pub mod loader;
pub mod locate;
pub mod model;
