mod error;
mod traits;

pub mod memory;
pub mod redis;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use traits::JobStore;
