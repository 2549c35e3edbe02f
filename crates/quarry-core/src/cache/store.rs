//! Persistent module cache storage seam.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::model::{
    ArtifactType, ComponentArtifactMetadata, ComponentMetadata, ModuleComponentIdentifier,
    ModuleIdentifier, RepositoryId,
};

/// A cached value with the time it was recorded.
#[derive(Debug, Clone)]
pub struct CachedEntry<T> {
    pub value: T,
    pub cached_at: DateTime<Utc>,
}

/// Key of a cached artifact set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactSetKey {
    Type(ModuleComponentIdentifier, ArtifactType),
    /// Component plus configuration name
    Usage(ModuleComponentIdentifier, String),
}

/// Storage engine behind the caching repository decorator.
///
/// Entries are scoped by repository id. Callers hold the cache lock while
/// reading or writing.
pub trait ModuleCacheStore: Send + Sync {
    fn module_versions(
        &self,
        repository: &RepositoryId,
        module: &ModuleIdentifier,
    ) -> Option<CachedEntry<Vec<String>>>;

    fn store_module_versions(
        &self,
        repository: &RepositoryId,
        module: ModuleIdentifier,
        versions: Vec<String>,
        cached_at: DateTime<Utc>,
    );

    /// `None` inside the entry records a module known to be missing.
    fn component_metadata(
        &self,
        repository: &RepositoryId,
        component: &ModuleComponentIdentifier,
    ) -> Option<CachedEntry<Option<ComponentMetadata>>>;

    fn store_component_metadata(
        &self,
        repository: &RepositoryId,
        component: ModuleComponentIdentifier,
        metadata: Option<ComponentMetadata>,
        cached_at: DateTime<Utc>,
    );

    fn module_artifacts(
        &self,
        repository: &RepositoryId,
        key: &ArtifactSetKey,
    ) -> Option<CachedEntry<Vec<ComponentArtifactMetadata>>>;

    fn store_module_artifacts(
        &self,
        repository: &RepositoryId,
        key: ArtifactSetKey,
        artifacts: Vec<ComponentArtifactMetadata>,
        cached_at: DateTime<Utc>,
    );

    /// Where a single artifact was downloaded from this repository.
    /// `None` inside the entry records an artifact the repository lacks.
    fn artifact_location(
        &self,
        repository: &RepositoryId,
        artifact: &ComponentArtifactMetadata,
    ) -> Option<CachedEntry<Option<PathBuf>>>;

    fn store_artifact_location(
        &self,
        repository: &RepositoryId,
        artifact: ComponentArtifactMetadata,
        location: Option<PathBuf>,
        cached_at: DateTime<Utc>,
    );
}

type Keyed<K, V> = Mutex<HashMap<(RepositoryId, K), CachedEntry<V>>>;

/// Process-local store, used when no on-disk engine is plugged in.
#[derive(Default)]
pub struct InMemoryModuleCacheStore {
    versions: Keyed<ModuleIdentifier, Vec<String>>,
    metadata: Keyed<ModuleComponentIdentifier, Option<ComponentMetadata>>,
    artifacts: Keyed<ArtifactSetKey, Vec<ComponentArtifactMetadata>>,
    locations: Keyed<ComponentArtifactMetadata, Option<PathBuf>>,
}

impl InMemoryModuleCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModuleCacheStore for InMemoryModuleCacheStore {
    fn module_versions(
        &self,
        repository: &RepositoryId,
        module: &ModuleIdentifier,
    ) -> Option<CachedEntry<Vec<String>>> {
        self.versions
            .lock()
            .get(&(repository.clone(), module.clone()))
            .cloned()
    }

    fn store_module_versions(
        &self,
        repository: &RepositoryId,
        module: ModuleIdentifier,
        versions: Vec<String>,
        cached_at: DateTime<Utc>,
    ) {
        self.versions.lock().insert(
            (repository.clone(), module),
            CachedEntry {
                value: versions,
                cached_at,
            },
        );
    }

    fn component_metadata(
        &self,
        repository: &RepositoryId,
        component: &ModuleComponentIdentifier,
    ) -> Option<CachedEntry<Option<ComponentMetadata>>> {
        self.metadata
            .lock()
            .get(&(repository.clone(), component.clone()))
            .cloned()
    }

    fn store_component_metadata(
        &self,
        repository: &RepositoryId,
        component: ModuleComponentIdentifier,
        metadata: Option<ComponentMetadata>,
        cached_at: DateTime<Utc>,
    ) {
        self.metadata.lock().insert(
            (repository.clone(), component),
            CachedEntry {
                value: metadata,
                cached_at,
            },
        );
    }

    fn module_artifacts(
        &self,
        repository: &RepositoryId,
        key: &ArtifactSetKey,
    ) -> Option<CachedEntry<Vec<ComponentArtifactMetadata>>> {
        self.artifacts
            .lock()
            .get(&(repository.clone(), key.clone()))
            .cloned()
    }

    fn store_module_artifacts(
        &self,
        repository: &RepositoryId,
        key: ArtifactSetKey,
        artifacts: Vec<ComponentArtifactMetadata>,
        cached_at: DateTime<Utc>,
    ) {
        self.artifacts.lock().insert(
            (repository.clone(), key),
            CachedEntry {
                value: artifacts,
                cached_at,
            },
        );
    }

    fn artifact_location(
        &self,
        repository: &RepositoryId,
        artifact: &ComponentArtifactMetadata,
    ) -> Option<CachedEntry<Option<PathBuf>>> {
        self.locations
            .lock()
            .get(&(repository.clone(), artifact.clone()))
            .cloned()
    }

    fn store_artifact_location(
        &self,
        repository: &RepositoryId,
        artifact: ComponentArtifactMetadata,
        location: Option<PathBuf>,
        cached_at: DateTime<Utc>,
    ) {
        self.locations.lock().insert(
            (repository.clone(), artifact),
            CachedEntry {
                value: location,
                cached_at,
            },
        );
    }
}
