pub mod redis;

pub use self::redis::{create_redis_client, Cache, CacheWriterHandle};
