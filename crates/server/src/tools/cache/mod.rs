//! Bucket inspection tools.

pub mod buckets;
pub mod get;

pub use buckets::{CacheBucketsParams, buckets_impl};
pub use get::{CacheGetParams, get_impl};
