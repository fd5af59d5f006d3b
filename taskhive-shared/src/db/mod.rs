/// Database utilities
///
/// - `pool`: PostgreSQL connection pool management
/// - `migrations`: Embedded schema migration runner

pub mod migrations;
pub mod pool;
