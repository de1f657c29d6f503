pub mod pool;
pub mod schema;
