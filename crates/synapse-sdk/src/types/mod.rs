pub mod address;
pub mod chain;
pub mod pool;
pub mod transaction;
