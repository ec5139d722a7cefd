//! Storage for the satellite pipeline.
//!
//! - Scene discovery and download from the public GOES bucket
//! - The on-disk image cache and its eviction sweep
//! - A small in-memory TTL cache for collaborator responses

pub mod goes_bucket;
pub mod image_cache;
pub mod scene;
pub mod ttl_cache;

pub use goes_bucket::{GoesBucket, GoesBucketConfig};
pub use image_cache::{
    CacheEntry, CacheFileKind, CacheFileName, CacheKey, DiskUsage, ImageCache, RetentionPolicy,
    SweepStats,
};
pub use scene::{LocatorConfig, ObjectEntry, SceneLocator, SceneRef, SceneSource};
pub use ttl_cache::{TtlCache, TtlCacheStats};
