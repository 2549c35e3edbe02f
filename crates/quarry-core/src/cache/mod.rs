//! Resolution caches.
//!
//! Two layers sit between the chain and a repository's transport:
//! - a persistent cache keyed per repository, with expiry decided by a
//!   [`CachePolicy`] against the build-commenced clock
//! - a build-scoped in-memory memo shared by every resolution in the build

mod caching;
mod memory;
mod module_id;
mod policy;
mod store;

pub use caching::CachingModuleComponentRepository;
pub use memory::InMemoryCachedRepositoryFactory;
pub use module_id::ModuleIdExtractor;
pub use policy::{BuildCommencedTimeProvider, CachePolicy, TimeProvider, entry_age};
pub use store::{ArtifactSetKey, CachedEntry, InMemoryModuleCacheStore, ModuleCacheStore};
