//! Quarry Core Library
//!
//! Assembles the chain of repositories a dependency resolution consults,
//! decorates each repository with cache locking and caching layers, and
//! dispatches artifact requests back to the repository that resolved the
//! owning component.

pub mod cache;
pub mod chain;
pub mod config;
pub mod context;
pub mod error;
pub mod factory;
pub mod legacy;
pub mod lock;
pub mod model;
pub mod repository;
pub mod version;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigStore, QuarryConfig, RepositoryConfig, RepositoryKind};

    // Session
    pub use crate::context::ResolutionServices;
    pub use crate::factory::{
        RepositoryLayer, RepositoryStack, ResolutionConfiguration, ResolveFactory, layer_plan,
    };

    // Chain
    pub use crate::chain::{
        ArtifactResolver, DependencyToComponentResolver, RepositoryChain, UserResolverChain,
    };

    // Repositories
    pub use crate::repository::{
        ConfiguredModuleComponentRepository, ModuleComponentRepository,
        ModuleComponentRepositoryAccess, ModuleMetadataProcessor, ResolutionAwareRepository,
        ResolutionOverride,
    };

    // Locking
    pub use crate::lock::{CacheLockingManager, DefaultCacheLockingManager};

    // Model
    pub use crate::error::ResolveError;
    pub use crate::model::{
        ArtifactType, ComponentArtifactMetadata, ComponentMetadata, ComponentUsage,
        DependencyMetadata, ModuleComponentIdentifier, ModuleSource, ModuleVersionSelector,
        RepositoryId,
    };
}
