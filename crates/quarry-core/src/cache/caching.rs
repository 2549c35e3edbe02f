//! Persistent-cache decorator.

use std::sync::Arc;

use crate::error::ResolveError;
use crate::lock::CacheLockingManager;
use crate::model::{
    ArtifactResult, ArtifactSetResult, ArtifactType, ComponentArtifactMetadata,
    ComponentMetadata, ComponentMetadataResult, ComponentUsage, DependencyMetadata,
    ModuleComponentIdentifier, ModuleSource, ModuleVersionListingResult, RepositoryId,
    ResolveState,
};
use crate::repository::{
    ModuleComponentRepository, ModuleComponentRepositoryAccess, ModuleMetadataProcessor,
};

use super::module_id::ModuleIdExtractor;
use super::policy::{CachePolicy, TimeProvider, entry_age};
use super::store::{ArtifactSetKey, ModuleCacheStore};

/// Short-circuits version listing, metadata, artifact-set and single-artifact
/// resolution with entries from a [`ModuleCacheStore`].
///
/// The local facet answers from the delegate's local facet, then from the
/// store. The remote facet asks the delegate's remote facet and records what
/// it returns. Artifact downloads consult the store's location index first.
/// Store access always happens under `use_cache`.
pub struct CachingModuleComponentRepository {
    delegate: Arc<dyn ModuleComponentRepository>,
    cache: Arc<CacheContext>,
    local: LocateInCacheAccess,
    remote: ResolveAndCacheAccess,
}

/// Collaborators shared by both facets.
struct CacheContext {
    repository_id: RepositoryId,
    store: Arc<dyn ModuleCacheStore>,
    policy: CachePolicy,
    time_provider: Arc<dyn TimeProvider>,
    processor: Arc<dyn ModuleMetadataProcessor>,
    extractor: ModuleIdExtractor,
    lock: Arc<dyn CacheLockingManager>,
}

impl CacheContext {
    fn read<T>(&self, operation: &str, lookup: impl FnOnce() -> Option<T>) -> Result<Option<T>, ResolveError> {
        let mut lookup = Some(lookup);
        let mut found = None;
        self.lock.use_cache(operation, &mut || {
            if let Some(lookup) = lookup.take() {
                found = lookup();
            }
            Ok(())
        })?;
        Ok(found)
    }

    fn write(&self, operation: &str, record: impl FnOnce()) -> Result<(), ResolveError> {
        let mut record = Some(record);
        self.lock.use_cache(operation, &mut || {
            if let Some(record) = record.take() {
                record();
            }
            Ok(())
        })
    }
}

impl CachingModuleComponentRepository {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        delegate: Arc<dyn ModuleComponentRepository>,
        store: Arc<dyn ModuleCacheStore>,
        policy: CachePolicy,
        time_provider: Arc<dyn TimeProvider>,
        processor: Arc<dyn ModuleMetadataProcessor>,
        extractor: ModuleIdExtractor,
        lock: Arc<dyn CacheLockingManager>,
    ) -> Self {
        let context = Arc::new(CacheContext {
            repository_id: delegate.id().clone(),
            store,
            policy,
            time_provider,
            processor,
            extractor,
            lock,
        });
        Self {
            local: LocateInCacheAccess {
                delegate: Arc::clone(&delegate),
                cache: Arc::clone(&context),
            },
            remote: ResolveAndCacheAccess {
                delegate: Arc::clone(&delegate),
                cache: Arc::clone(&context),
            },
            cache: context,
            delegate,
        }
    }
}

impl ModuleComponentRepository for CachingModuleComponentRepository {
    fn id(&self) -> &RepositoryId {
        self.delegate.id()
    }

    fn name(&self) -> &str {
        self.delegate.name()
    }

    fn local_access(&self) -> &dyn ModuleComponentRepositoryAccess {
        &self.local
    }

    fn remote_access(&self) -> &dyn ModuleComponentRepositoryAccess {
        &self.remote
    }

    fn resolve_artifact(
        &self,
        artifact: &ComponentArtifactMetadata,
        source: Option<&ModuleSource>,
        result: &mut ArtifactResult,
    ) -> Result<(), ResolveError> {
        let cache = &self.cache;
        let operation = format!("Read location of {} from cache", artifact);
        if let Some(entry) = cache.read(&operation, || {
            cache.store.artifact_location(&cache.repository_id, artifact)
        })? {
            let age = entry_age(entry.cached_at, cache.time_provider.current_time());
            match entry.value {
                Some(location) if !cache.policy.must_refresh_artifact(age) => {
                    tracing::trace!(artifact = %artifact, repository = %cache.repository_id, "artifact found in cache");
                    result.resolved(location);
                    return Ok(());
                }
                None if !cache.policy.must_refresh_missing_module(age) => {
                    result.missing();
                    return Ok(());
                }
                _ => tracing::trace!(artifact = %artifact, "cached artifact location expired"),
            }
        }

        self.delegate.resolve_artifact(artifact, source, result)?;

        let recorded = match result.state() {
            ResolveState::Resolved(location) => Some(location.clone()),
            ResolveState::Missing => None,
            _ => return Ok(()),
        };
        let now = cache.time_provider.current_time();
        let operation = format!("Store location of {} in cache", artifact);
        cache.write(&operation, || {
            cache.store.store_artifact_location(
                &cache.repository_id,
                artifact.clone(),
                recorded,
                now,
            )
        })
    }
}

struct LocateInCacheAccess {
    delegate: Arc<dyn ModuleComponentRepository>,
    cache: Arc<CacheContext>,
}

impl LocateInCacheAccess {
    fn cached_artifacts(
        &self,
        component: &ComponentMetadata,
        key: ArtifactSetKey,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        let cache = &self.cache;
        let operation = format!("Read artifacts for {} from cache", component);
        let Some(entry) = cache.read(&operation, || {
            cache.store.module_artifacts(&cache.repository_id, &key)
        })?
        else {
            return Ok(());
        };

        let age = entry_age(entry.cached_at, cache.time_provider.current_time());
        if cache.policy.must_refresh_artifacts(component.changing, age) {
            tracing::trace!(component = %component, "cached artifacts expired");
            return Ok(());
        }
        tracing::trace!(component = %component, repository = %cache.repository_id, "artifacts found in cache");
        result.resolved(entry.value);
        Ok(())
    }
}

impl ModuleComponentRepositoryAccess for LocateInCacheAccess {
    fn list_module_versions(
        &self,
        dependency: &DependencyMetadata,
        result: &mut ModuleVersionListingResult,
    ) -> Result<(), ResolveError> {
        self.delegate
            .local_access()
            .list_module_versions(dependency, result)?;
        if result.has_result() {
            return Ok(());
        }

        let cache = &self.cache;
        let module = cache.extractor.extract(&dependency.requested);
        let operation = format!("Read versions of {} from cache", module);
        let Some(entry) = cache.read(&operation, || {
            cache.store.module_versions(&cache.repository_id, &module)
        })?
        else {
            return Ok(());
        };

        let age = entry_age(entry.cached_at, cache.time_provider.current_time());
        if cache.policy.must_refresh_version_list(age) {
            tracing::trace!(module = %module, "cached version listing expired");
            return Ok(());
        }
        tracing::trace!(module = %module, repository = %cache.repository_id, "version listing found in cache");
        result.resolved(entry.value);
        Ok(())
    }

    fn resolve_component_metadata(
        &self,
        dependency: &DependencyMetadata,
        component_id: &ModuleComponentIdentifier,
        result: &mut ComponentMetadataResult,
    ) -> Result<(), ResolveError> {
        let cache = &self.cache;
        self.delegate
            .local_access()
            .resolve_component_metadata(dependency, component_id, result)?;
        if result.has_result() {
            if let Some(metadata) = result.value_mut() {
                cache.processor.process(metadata);
            }
            return Ok(());
        }

        let operation = format!("Read metadata of {} from cache", component_id);
        let Some(entry) = cache.read(&operation, || {
            cache.store.component_metadata(&cache.repository_id, component_id)
        })?
        else {
            return Ok(());
        };

        let age = entry_age(entry.cached_at, cache.time_provider.current_time());
        match entry.value {
            Some(mut metadata) => {
                let changing = metadata.changing || dependency.changing;
                if cache.policy.must_refresh_module(changing, age) {
                    tracing::trace!(component = %component_id, "cached metadata expired");
                    return Ok(());
                }
                cache.processor.process(&mut metadata);
                result.resolved(metadata);
            }
            None => {
                if cache.policy.must_refresh_missing_module(age) {
                    return Ok(());
                }
                result.missing();
            }
        }
        Ok(())
    }

    fn resolve_module_artifacts_by_type(
        &self,
        component: &ComponentMetadata,
        artifact_type: ArtifactType,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        self.delegate
            .local_access()
            .resolve_module_artifacts_by_type(component, artifact_type, result)?;
        if result.has_result() {
            return Ok(());
        }
        let key = ArtifactSetKey::Type(component.id.clone(), artifact_type);
        self.cached_artifacts(component, key, result)
    }

    fn resolve_module_artifacts_by_usage(
        &self,
        component: &ComponentMetadata,
        usage: &ComponentUsage,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        self.delegate
            .local_access()
            .resolve_module_artifacts_by_usage(component, usage, result)?;
        if result.has_result() {
            return Ok(());
        }
        let key = ArtifactSetKey::Usage(component.id.clone(), usage.configuration.clone());
        self.cached_artifacts(component, key, result)
    }
}

struct ResolveAndCacheAccess {
    delegate: Arc<dyn ModuleComponentRepository>,
    cache: Arc<CacheContext>,
}

impl ResolveAndCacheAccess {
    fn record_artifacts(
        &self,
        component: &ComponentMetadata,
        key: ArtifactSetKey,
        result: &ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        let Some(artifacts) = result.value() else {
            return Ok(());
        };
        let cache = &self.cache;
        let artifacts = artifacts.clone();
        let now = cache.time_provider.current_time();
        let operation = format!("Store artifacts for {} in cache", component);
        cache.write(&operation, || {
            cache
                .store
                .store_module_artifacts(&cache.repository_id, key, artifacts, now)
        })
    }
}

impl ModuleComponentRepositoryAccess for ResolveAndCacheAccess {
    fn list_module_versions(
        &self,
        dependency: &DependencyMetadata,
        result: &mut ModuleVersionListingResult,
    ) -> Result<(), ResolveError> {
        self.delegate
            .remote_access()
            .list_module_versions(dependency, result)?;

        let Some(versions) = result.value() else {
            return Ok(());
        };
        let cache = &self.cache;
        let module = cache.extractor.extract(&dependency.requested);
        let versions = versions.clone();
        let now = cache.time_provider.current_time();
        let operation = format!("Store versions of {} in cache", module);
        cache.write(&operation, || {
            cache
                .store
                .store_module_versions(&cache.repository_id, module.clone(), versions, now)
        })
    }

    fn resolve_component_metadata(
        &self,
        dependency: &DependencyMetadata,
        component_id: &ModuleComponentIdentifier,
        result: &mut ComponentMetadataResult,
    ) -> Result<(), ResolveError> {
        self.delegate
            .remote_access()
            .resolve_component_metadata(dependency, component_id, result)?;

        let cache = &self.cache;
        let recorded = if let Some(metadata) = result.value_mut() {
            let raw = metadata.clone();
            cache.processor.process(metadata);
            Some(raw)
        } else if result.is_missing() {
            None
        } else {
            return Ok(());
        };

        let now = cache.time_provider.current_time();
        let operation = format!("Store metadata of {} in cache", component_id);
        cache.write(&operation, || {
            cache.store.store_component_metadata(
                &cache.repository_id,
                component_id.clone(),
                recorded,
                now,
            )
        })
    }

    fn resolve_module_artifacts_by_type(
        &self,
        component: &ComponentMetadata,
        artifact_type: ArtifactType,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        self.delegate
            .remote_access()
            .resolve_module_artifacts_by_type(component, artifact_type, result)?;
        let key = ArtifactSetKey::Type(component.id.clone(), artifact_type);
        self.record_artifacts(component, key, result)
    }

    fn resolve_module_artifacts_by_usage(
        &self,
        component: &ComponentMetadata,
        usage: &ComponentUsage,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        self.delegate
            .remote_access()
            .resolve_module_artifacts_by_usage(component, usage, result)?;
        let key = ArtifactSetKey::Usage(component.id.clone(), usage.configuration.clone());
        self.record_artifacts(component, key, result)
    }
}
