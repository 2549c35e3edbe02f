#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use quarry_core::chain::RepositoryChain;
use quarry_core::error::ResolveError;
use quarry_core::legacy::{LegacyEngineRepository, LegacyResolveData, LegacySettings};
use quarry_core::lock::{CacheLockingManager, DefaultCacheLockingManager, LockAction};
use quarry_core::model::{
    ArtifactName, ArtifactResult, ArtifactSetResult, ArtifactType, ComponentArtifactMetadata,
    ComponentMetadata, ComponentMetadataResult, ComponentUsage, DependencyMetadata,
    ModuleComponentIdentifier, ModuleSource, ModuleVersionListingResult, ModuleVersionSelector,
    RepositoryId,
};
use quarry_core::repository::{
    ChainAwareRepository, ConfiguredModuleComponentRepository, ModuleComponentRepository,
    ModuleComponentRepositoryAccess, ResolutionAwareRepository,
};

pub fn selector(group: &str, name: &str, version: &str) -> ModuleVersionSelector {
    ModuleVersionSelector::new(group, name, version)
}

pub fn dependency(group: &str, name: &str, version: &str) -> DependencyMetadata {
    DependencyMetadata::new(selector(group, name, version))
}

pub fn component_id(group: &str, name: &str, version: &str) -> ModuleComponentIdentifier {
    ModuleComponentIdentifier::new(group, name, version)
}

pub fn component(group: &str, name: &str, version: &str) -> ComponentMetadata {
    ComponentMetadata::new(component_id(group, name, version))
}

pub fn jar(component: &ComponentMetadata) -> ComponentArtifactMetadata {
    ComponentArtifactMetadata::new(
        component.id.clone(),
        ArtifactName::new(component.id.module.clone(), "jar", "jar"),
    )
}

/// Lock manager that records every entry point call and delegates to the
/// real reentrant lock.
#[derive(Default)]
pub struct RecordingLockManager {
    inner: DefaultCacheLockingManager,
    events: Mutex<Vec<String>>,
}

impl RecordingLockManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn is_held_by_current_thread(&self) -> bool {
        self.inner.is_held_by_current_thread()
    }
}

impl CacheLockingManager for RecordingLockManager {
    fn use_cache(&self, operation: &str, action: LockAction<'_>) -> Result<(), ResolveError> {
        self.events.lock().push(format!("use_cache: {operation}"));
        self.inner.use_cache(operation, action)
    }

    fn long_running_operation(
        &self,
        operation: &str,
        action: LockAction<'_>,
    ) -> Result<(), ResolveError> {
        self.events
            .lock()
            .push(format!("long_running_operation: {operation}"));
        self.inner.long_running_operation(operation, action)
    }
}

/// One scripted facet of a [`MockRepository`].
#[derive(Default)]
pub struct MockAccess {
    versions: Mutex<Option<Vec<String>>>,
    metadata: Mutex<HashMap<ModuleComponentIdentifier, ComponentMetadata>>,
    artifacts: Mutex<Option<Vec<ComponentArtifactMetadata>>>,
    failure: Mutex<Option<ResolveError>>,
    error: Mutex<Option<ResolveError>>,
    calls: Mutex<Vec<String>>,
    seen_sources: Mutex<Vec<Option<ModuleSource>>>,
    lock_held: Mutex<Vec<bool>>,
    watched: Mutex<Option<Arc<RecordingLockManager>>>,
}

impl MockAccess {
    pub fn set_versions(&self, versions: &[&str]) {
        *self.versions.lock() = Some(versions.iter().map(|v| v.to_string()).collect());
    }

    pub fn add_component(&self, metadata: ComponentMetadata) {
        self.metadata.lock().insert(metadata.id.clone(), metadata);
    }

    pub fn set_artifacts(&self, artifacts: Vec<ComponentArtifactMetadata>) {
        *self.artifacts.lock() = Some(artifacts);
    }

    /// Record `error` as the outcome of every metadata request.
    pub fn fail_with(&self, error: ResolveError) {
        *self.failure.lock() = Some(error);
    }

    /// Return `error` from every metadata request.
    pub fn error_with(&self, error: ResolveError) {
        *self.error.lock() = Some(error);
    }

    /// Record whether `lock` is held during each call.
    pub fn watch_lock(&self, lock: Arc<RecordingLockManager>) {
        *self.watched.lock() = Some(lock);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn seen_sources(&self) -> Vec<Option<ModuleSource>> {
        self.seen_sources.lock().clone()
    }

    pub fn lock_held(&self) -> Vec<bool> {
        self.lock_held.lock().clone()
    }

    fn record(&self, call: String) {
        if let Some(lock) = self.watched.lock().as_ref() {
            self.lock_held.lock().push(lock.is_held_by_current_thread());
        }
        self.calls.lock().push(call);
    }

    fn answer_artifacts(&self, component: &ComponentMetadata, result: &mut ArtifactSetResult) {
        self.seen_sources.lock().push(component.source().cloned());
        if let Some(artifacts) = self.artifacts.lock().clone() {
            result.resolved(artifacts);
        }
    }
}

impl ModuleComponentRepositoryAccess for MockAccess {
    fn list_module_versions(
        &self,
        dependency: &DependencyMetadata,
        result: &mut ModuleVersionListingResult,
    ) -> Result<(), ResolveError> {
        self.record(format!("list {}", dependency));
        if let Some(versions) = self.versions.lock().clone() {
            result.resolved(versions);
        }
        Ok(())
    }

    fn resolve_component_metadata(
        &self,
        _dependency: &DependencyMetadata,
        component_id: &ModuleComponentIdentifier,
        result: &mut ComponentMetadataResult,
    ) -> Result<(), ResolveError> {
        self.record(format!("metadata {}", component_id));
        if let Some(error) = self.error.lock().clone() {
            return Err(error);
        }
        if let Some(error) = self.failure.lock().clone() {
            result.failed(error);
        } else if let Some(metadata) = self.metadata.lock().get(component_id).cloned() {
            result.resolved(metadata);
        }
        Ok(())
    }

    fn resolve_module_artifacts_by_type(
        &self,
        component: &ComponentMetadata,
        artifact_type: ArtifactType,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        self.record(format!("artifacts {} {}", artifact_type, component));
        self.answer_artifacts(component, result);
        Ok(())
    }

    fn resolve_module_artifacts_by_usage(
        &self,
        component: &ComponentMetadata,
        usage: &ComponentUsage,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        self.record(format!("artifacts {} {}", usage.configuration, component));
        self.answer_artifacts(component, result);
        Ok(())
    }
}

#[derive(Default)]
pub struct LegacyContext {
    pub settings: Option<LegacySettings>,
    pub resolve_data: Option<LegacyResolveData>,
}

/// Scripted repository. Clones share their facets, so a test keeps one
/// handle and gives another to the code under test.
#[derive(Clone)]
pub struct MockRepository {
    id: RepositoryId,
    is_local: bool,
    dynamic_resolve: bool,
    pub local: Arc<MockAccess>,
    pub remote: Arc<MockAccess>,
    pub downloads: Arc<MockAccess>,
    legacy: Option<Arc<Mutex<LegacyContext>>>,
    parent: Option<Arc<Mutex<Option<Arc<dyn RepositoryChain>>>>>,
}

impl MockRepository {
    pub fn remote(id: &str) -> Self {
        Self {
            id: RepositoryId::new(id),
            is_local: false,
            dynamic_resolve: false,
            local: Arc::default(),
            remote: Arc::default(),
            downloads: Arc::default(),
            legacy: None,
            parent: None,
        }
    }

    pub fn local(id: &str) -> Self {
        Self {
            is_local: true,
            ..Self::remote(id)
        }
    }

    pub fn dynamic_resolve(mut self) -> Self {
        self.dynamic_resolve = true;
        self
    }

    /// Make this a legacy engine; the returned slot receives its session context.
    pub fn legacy(mut self) -> (Self, Arc<Mutex<LegacyContext>>) {
        let context = Arc::new(Mutex::new(LegacyContext::default()));
        self.legacy = Some(Arc::clone(&context));
        (self, context)
    }

    /// Make this chain-aware; the returned slot receives the parent resolver.
    pub fn chain_aware(mut self) -> (Self, Arc<Mutex<Option<Arc<dyn RepositoryChain>>>>) {
        let slot = Arc::new(Mutex::new(None));
        self.parent = Some(Arc::clone(&slot));
        (self, slot)
    }

    pub fn connector(&self) -> Arc<dyn ResolutionAwareRepository> {
        Arc::new(MockConnector {
            repository: self.clone(),
        })
    }

    /// Total calls across both facets and downloads.
    pub fn total_calls(&self) -> usize {
        self.local.call_count() + self.remote.call_count() + self.downloads.call_count()
    }
}

impl ModuleComponentRepository for MockRepository {
    fn id(&self) -> &RepositoryId {
        &self.id
    }

    fn name(&self) -> &str {
        self.id.as_str()
    }

    fn local_access(&self) -> &dyn ModuleComponentRepositoryAccess {
        self.local.as_ref()
    }

    fn remote_access(&self) -> &dyn ModuleComponentRepositoryAccess {
        self.remote.as_ref()
    }

    fn resolve_artifact(
        &self,
        artifact: &ComponentArtifactMetadata,
        source: Option<&ModuleSource>,
        result: &mut ArtifactResult,
    ) -> Result<(), ResolveError> {
        self.downloads.record(format!("download {}", artifact));
        self.downloads.seen_sources.lock().push(source.cloned());
        result.resolved(PathBuf::from(format!("/cache/{}/{}", self.id, artifact.name)));
        Ok(())
    }
}

impl ConfiguredModuleComponentRepository for MockRepository {
    fn is_local(&self) -> bool {
        self.is_local
    }

    fn is_dynamic_resolve_mode(&self) -> bool {
        self.dynamic_resolve
    }

    fn as_legacy_engine(&mut self) -> Option<&mut dyn LegacyEngineRepository> {
        if self.legacy.is_some() {
            Some(self)
        } else {
            None
        }
    }

    fn as_chain_aware(&mut self) -> Option<&mut dyn ChainAwareRepository> {
        if self.parent.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl LegacyEngineRepository for MockRepository {
    fn set_settings(&mut self, settings: LegacySettings) {
        if let Some(context) = &self.legacy {
            context.lock().settings = Some(settings);
        }
    }

    fn set_resolve_data(&mut self, data: LegacyResolveData) {
        if let Some(context) = &self.legacy {
            context.lock().resolve_data = Some(data);
        }
    }
}

impl ChainAwareRepository for MockRepository {
    fn set_repository_chain(&mut self, chain: Arc<dyn RepositoryChain>) {
        if let Some(slot) = &self.parent {
            *slot.lock() = Some(chain);
        }
    }
}

/// Hands out a fresh clone of its repository per resolution.
pub struct MockConnector {
    repository: MockRepository,
}

impl ResolutionAwareRepository for MockConnector {
    fn create_resolver(&self) -> Box<dyn ConfiguredModuleComponentRepository> {
        Box::new(self.repository.clone())
    }
}
