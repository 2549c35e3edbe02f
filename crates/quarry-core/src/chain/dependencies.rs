use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ResolveError;
use crate::model::{
    ComponentMetadataResult, DependencyMetadata, ModuleComponentIdentifier, ModuleSource,
    ModuleVersionListingResult, ResolveState,
};
use crate::repository::ModuleComponentRepository;
use crate::version::{LatestStrategy, VersionMatcher};

use super::DependencyToComponentResolver;

/// Resolves dependencies against repositories in declaration order.
///
/// Within a repository the local facet is asked before the remote one. The
/// first repository producing metadata wins and its component is tagged with
/// that repository's chain source.
pub struct RepositoryChainDependencyResolver {
    repositories: RwLock<Vec<Arc<dyn ModuleComponentRepository>>>,
    matcher: Arc<dyn VersionMatcher>,
    latest: Arc<dyn LatestStrategy>,
}

impl RepositoryChainDependencyResolver {
    pub fn new(matcher: Arc<dyn VersionMatcher>, latest: Arc<dyn LatestStrategy>) -> Self {
        Self {
            repositories: RwLock::new(Vec::new()),
            matcher,
            latest,
        }
    }

    pub fn add(&self, repository: Arc<dyn ModuleComponentRepository>) {
        self.repositories.write().push(repository);
    }

    /// Pin a dynamic selector to the newest accepted version the repository
    /// lists. `None` when the repository answered and the attempt is settled.
    fn select_version(
        &self,
        repository: &dyn ModuleComponentRepository,
        dependency: &DependencyMetadata,
        attempt: &mut ComponentMetadataResult,
    ) -> Result<Option<DependencyMetadata>, ResolveError> {
        let selector = &dependency.requested.version;
        if !self.matcher.is_dynamic(selector) {
            return Ok(Some(dependency.clone()));
        }

        let mut listing = ModuleVersionListingResult::new();
        repository
            .local_access()
            .list_module_versions(dependency, &mut listing)?;
        if !listing.has_result() {
            repository
                .remote_access()
                .list_module_versions(dependency, &mut listing)?;
        }

        match listing.into_state() {
            ResolveState::Resolved(versions) => {
                let accepted: Vec<String> = versions
                    .into_iter()
                    .filter(|version| self.matcher.accepts(selector, version))
                    .collect();
                match self.latest.find_latest(&accepted) {
                    Some(version) => {
                        tracing::debug!(dependency = %dependency, version = %version, repository = %repository.id(), "selected version");
                        Ok(Some(dependency.with_requested_version(version)))
                    }
                    None => {
                        attempt.missing();
                        Ok(None)
                    }
                }
            }
            ResolveState::Failed(error) => {
                attempt.failed(error);
                Ok(None)
            }
            ResolveState::Missing | ResolveState::Unresolved => {
                attempt.missing();
                Ok(None)
            }
        }
    }

    fn resolve_in(
        &self,
        repository: &dyn ModuleComponentRepository,
        dependency: &DependencyMetadata,
        attempt: &mut ComponentMetadataResult,
    ) -> Result<(), ResolveError> {
        let Some(dependency) = self.select_version(repository, dependency, attempt)? else {
            return Ok(());
        };
        let component_id = ModuleComponentIdentifier::from_selector(&dependency.requested);

        repository
            .local_access()
            .resolve_component_metadata(&dependency, &component_id, attempt)?;
        if !attempt.has_result() {
            repository
                .remote_access()
                .resolve_component_metadata(&dependency, &component_id, attempt)?;
        }
        Ok(())
    }
}

impl DependencyToComponentResolver for RepositoryChainDependencyResolver {
    fn resolve(
        &self,
        dependency: &DependencyMetadata,
        result: &mut ComponentMetadataResult,
    ) -> Result<(), ResolveError> {
        // Repositories may re-enter the chain, so never hold the lock across calls.
        let repositories = self.repositories.read().clone();
        let mut failure = None;

        for repository in &repositories {
            let mut attempt = ComponentMetadataResult::new();
            self.resolve_in(repository.as_ref(), dependency, &mut attempt)?;

            match attempt.into_state() {
                ResolveState::Resolved(metadata) => {
                    let source = ModuleSource::chain(repository.id().clone(), metadata.source().cloned());
                    tracing::debug!(dependency = %dependency, repository = %repository.id(), "resolved");
                    result.resolved(metadata.with_source(Some(source)));
                    return Ok(());
                }
                ResolveState::Failed(error) => {
                    tracing::debug!(dependency = %dependency, repository = %repository.id(), error = %error, "resolution failed");
                    failure.get_or_insert(error);
                }
                ResolveState::Missing | ResolveState::Unresolved => {
                    tracing::trace!(dependency = %dependency, repository = %repository.id(), "not found");
                }
            }
        }

        match failure {
            Some(error) => result.failed(error),
            None => result.missing(),
        }
        Ok(())
    }
}
