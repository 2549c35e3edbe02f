//! Releases the cache lock around remote calls.

use std::sync::Arc;

use crate::error::ResolveError;
use crate::lock::CacheLockingManager;
use crate::model::{
    ArtifactResult, ArtifactSetResult, ArtifactType, ComponentArtifactMetadata,
    ComponentMetadata, ComponentMetadataResult, ComponentUsage, DependencyMetadata,
    ModuleComponentIdentifier, ModuleSource, ModuleVersionListingResult, RepositoryId,
};

use super::{ModuleComponentRepository, ModuleComponentRepositoryAccess};

/// Runs every remote call of the wrapped repository as a long-running
/// operation, so the cache lock is never held across network I/O.
///
/// Local access is passed through unchanged.
pub struct CacheLockReleasingModuleComponentRepository {
    delegate: Arc<dyn ModuleComponentRepository>,
    remote: LockReleasingRepositoryAccess,
    lock: Arc<dyn CacheLockingManager>,
}

impl CacheLockReleasingModuleComponentRepository {
    pub fn new(
        delegate: Arc<dyn ModuleComponentRepository>,
        lock: Arc<dyn CacheLockingManager>,
    ) -> Self {
        let remote = LockReleasingRepositoryAccess {
            delegate: Arc::clone(&delegate),
            lock: Arc::clone(&lock),
        };
        Self {
            delegate,
            remote,
            lock,
        }
    }
}

impl ModuleComponentRepository for CacheLockReleasingModuleComponentRepository {
    fn id(&self) -> &RepositoryId {
        self.delegate.id()
    }

    fn name(&self) -> &str {
        self.delegate.name()
    }

    fn local_access(&self) -> &dyn ModuleComponentRepositoryAccess {
        self.delegate.local_access()
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
        let operation = format!("Download {} using repository {}", artifact, self.id());
        self.lock.long_running_operation(&operation, &mut || {
            self.delegate.resolve_artifact(artifact, source, result)
        })
    }
}

struct LockReleasingRepositoryAccess {
    delegate: Arc<dyn ModuleComponentRepository>,
    lock: Arc<dyn CacheLockingManager>,
}

impl ModuleComponentRepositoryAccess for LockReleasingRepositoryAccess {
    fn list_module_versions(
        &self,
        dependency: &DependencyMetadata,
        result: &mut ModuleVersionListingResult,
    ) -> Result<(), ResolveError> {
        let operation = format!("List {} using repository {}", dependency, self.delegate.id());
        self.lock.long_running_operation(&operation, &mut || {
            self.delegate
                .remote_access()
                .list_module_versions(dependency, result)
        })
    }

    fn resolve_component_metadata(
        &self,
        dependency: &DependencyMetadata,
        component_id: &ModuleComponentIdentifier,
        result: &mut ComponentMetadataResult,
    ) -> Result<(), ResolveError> {
        let operation = format!(
            "Resolve {} using repository {}",
            dependency,
            self.delegate.id()
        );
        self.lock.long_running_operation(&operation, &mut || {
            self.delegate
                .remote_access()
                .resolve_component_metadata(dependency, component_id, result)
        })
    }

    fn resolve_module_artifacts_by_type(
        &self,
        component: &ComponentMetadata,
        artifact_type: ArtifactType,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        let operation = format!(
            "Resolve {} for {} using repository {}",
            artifact_type,
            component,
            self.delegate.id()
        );
        self.lock.long_running_operation(&operation, &mut || {
            self.delegate
                .remote_access()
                .resolve_module_artifacts_by_type(component, artifact_type, result)
        })
    }

    fn resolve_module_artifacts_by_usage(
        &self,
        component: &ComponentMetadata,
        usage: &ComponentUsage,
        result: &mut ArtifactSetResult,
    ) -> Result<(), ResolveError> {
        let operation = format!(
            "Resolve {} for {} using repository {}",
            usage,
            component,
            self.delegate.id()
        );
        self.lock.long_running_operation(&operation, &mut || {
            self.delegate
                .remote_access()
                .resolve_module_artifacts_by_usage(component, usage, result)
        })
    }
}
