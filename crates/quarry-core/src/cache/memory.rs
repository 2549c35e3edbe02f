//! Build-scoped in-memory memoization of repository answers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ResolveError;
use crate::model::{
    ArtifactResult, ArtifactSetResult, ArtifactType, BuildableResult, ComponentArtifactMetadata,
    ComponentMetadata, ComponentMetadataResult, ComponentUsage, DependencyMetadata,
    ModuleComponentIdentifier, ModuleSource, ModuleVersionListingResult, ModuleVersionSelector,
    RepositoryId, ResolveState,
};
use crate::repository::{Facet, ModuleComponentRepository, ModuleComponentRepositoryAccess};

use super::store::ArtifactSetKey;

/// Hands out repositories whose answers are remembered for the rest of the
/// build, shared between every resolution that uses the same repository id.
#[derive(Default)]
pub struct InMemoryCachedRepositoryFactory {
    caches: Mutex<HashMap<RepositoryId, Arc<RepositoryCaches>>>,
}

impl InMemoryCachedRepositoryFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(
        &self,
        delegate: Arc<dyn ModuleComponentRepository>,
    ) -> Arc<dyn ModuleComponentRepository> {
        let caches = Arc::clone(
            self.caches
                .lock()
                .entry(delegate.id().clone())
                .or_default(),
        );
        Arc::new(InMemoryCachedModuleComponentRepository::new(delegate, caches))
    }

    /// Forget everything; called when a build finishes.
    pub fn clear(&self) {
        let dropped = std::mem::take(&mut *self.caches.lock());
        tracing::debug!(repositories = dropped.len(), "cleared in-memory repository caches");
    }
}

#[derive(Default)]
struct RepositoryCaches {
    local: FacetCache,
    remote: FacetCache,
}

/// Memoized answers of one facet. Only resolved and missing outcomes are kept.
#[derive(Default)]
struct FacetCache {
    listings: Mutex<HashMap<ModuleVersionSelector, Option<Vec<String>>>>,
    metadata: Mutex<HashMap<ModuleComponentIdentifier, Option<ComponentMetadata>>>,
    artifacts: Mutex<HashMap<ArtifactSetKey, Vec<ComponentArtifactMetadata>>>,
}

fn remembered<T: Clone>(result: &BuildableResult<T>) -> Option<Option<T>> {
    match result.state() {
        ResolveState::Resolved(value) => Some(Some(value.clone())),
        ResolveState::Missing => Some(None),
        _ => None,
    }
}

fn replay<T>(entry: Option<T>, result: &mut BuildableResult<T>) {
    match entry {
        Some(value) => result.resolved(value),
        None => result.missing(),
    }
}

struct InMemoryCachedModuleComponentRepository {
    delegate: Arc<dyn ModuleComponentRepository>,
    local: InMemoryCachedAccess,
    remote: InMemoryCachedAccess,
}

impl InMemoryCachedModuleComponentRepository {
    fn new(delegate: Arc<dyn ModuleComponentRepository>, caches: Arc<RepositoryCaches>) -> Self {
        Self {
            local: InMemoryCachedAccess {
                delegate: Arc::clone(&delegate),
                facet: Facet::Local,
                caches: Arc::clone(&caches),
            },
            remote: InMemoryCachedAccess {
                delegate: Arc::clone(&delegate),
                facet: Facet::Remote,
                caches,
            },
            delegate,
        }
    }
}

impl ModuleComponentRepository for InMemoryCachedModuleComponentRepository {
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
        self.delegate.resolve_artifact(artifact, source, result)
    }
}

struct InMemoryCachedAccess {
    delegate: Arc<dyn ModuleComponentRepository>,
    facet: Facet,
    caches: Arc<RepositoryCaches>,
}

impl InMemoryCachedAccess {
    fn access(&self) -> &dyn ModuleComponentRepositoryAccess {
        self.facet.select(self.delegate.as_ref())
    }

    fn cache(&self) -> &FacetCache {
        match self.facet {
            Facet::Local => &self.caches.local,
            Facet::Remote => &self.caches.remote,
        }
    }

    fn artifacts(
        &self,
        key: ArtifactSetKey,
        result: &mut ArtifactSetResult,
        resolve: impl FnOnce(&mut ArtifactSetResult) -> Result<(), ResolveError>,
    ) -> Result<(), ResolveError> {
        if let Some(artifacts) = self.cache().artifacts.lock().get(&key).cloned() {
            result.resolved(artifacts);
            return Ok(());
        }
        resolve(result)?;
        if let Some(artifacts) = result.value() {
            self.cache().artifacts.lock().insert(key, artifacts.clone());
        }
        Ok(())
    }
}

impl ModuleComponentRepositoryAccess for InMemoryCachedAccess {
    fn list_module_versions(
        &self,
        dependency: &DependencyMetadata,
        result: &mut ModuleVersionListingResult,
    ) -> Result<(), ResolveError> {
        let selector = &dependency.requested;
        if let Some(entry) = self.cache().listings.lock().get(selector).cloned() {
            replay(entry, result);
            return Ok(());
        }
        self.access().list_module_versions(dependency, result)?;
        if let Some(entry) = remembered(result) {
            self.cache().listings.lock().insert(selector.clone(), entry);
        }
        Ok(())
    }

    fn resolve_component_metadata(
        &self,
        dependency: &DependencyMetadata,
        component_id: &ModuleComponentIdentifier,
        result: &mut ComponentMetadataResult,
    ) -> Result<(), ResolveError> {
        if let Some(entry) = self.cache().metadata.lock().get(component_id).cloned() {
            replay(entry, result);
            return Ok(());
        }
        self.access()
            .resolve_component_metadata(dependency, component_id, result)?;
        if let Some(entry) = remembered(result) {
            self.cache()
                .metadata
                .lock()
                .insert(component_id.clone(), entry);
        }
        Ok(())
    }

    fn resolve_module_artifacts_by_type(
        &self,
        component: &ComponentMetadata,
        artifact_type: ArtifactType,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        let key = ArtifactSetKey::Type(component.id.clone(), artifact_type);
        self.artifacts(key, result, |result| {
            self.access()
                .resolve_module_artifacts_by_type(component, artifact_type, result)
        })
    }

    fn resolve_module_artifacts_by_usage(
        &self,
        component: &ComponentMetadata,
        usage: &ComponentUsage,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        let key = ArtifactSetKey::Usage(component.id.clone(), usage.configuration.clone());
        self.artifacts(key, result, |result| {
            self.access()
                .resolve_module_artifacts_by_usage(component, usage, result)
        })
    }
}
