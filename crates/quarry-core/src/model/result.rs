//! Write-once resolution results.

use std::path::PathBuf;

use crate::error::ResolveError;

use super::{ComponentArtifactMetadata, ComponentMetadata};

/// State of a resolution result.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveState<T> {
    /// No stage has answered yet
    Unresolved,
    Resolved(T),
    /// A stage determined the target does not exist
    Missing,
    Failed(ResolveError),
}

/// A result object filled by at most one resolution stage.
///
/// Stages check [`has_result`](Self::has_result) before acting. A write to a
/// result that already holds an answer is ignored, so an earlier (local)
/// answer is never replaced by a later (remote) one.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildableResult<T> {
    state: ResolveState<T>,
}

/// Versions listed for a module.
pub type ModuleVersionListingResult = BuildableResult<Vec<String>>;
/// Metadata of one component version.
pub type ComponentMetadataResult = BuildableResult<ComponentMetadata>;
/// Artifacts of a component for a type or usage.
pub type ArtifactSetResult = BuildableResult<Vec<ComponentArtifactMetadata>>;
/// Local file of a single artifact.
pub type ArtifactResult = BuildableResult<PathBuf>;

impl<T> BuildableResult<T> {
    pub fn new() -> Self {
        Self {
            state: ResolveState::Unresolved,
        }
    }

    pub fn has_result(&self) -> bool {
        !matches!(self.state, ResolveState::Unresolved)
    }

    pub fn resolved(&mut self, value: T) {
        self.fill(ResolveState::Resolved(value));
    }

    pub fn missing(&mut self) {
        self.fill(ResolveState::Missing);
    }

    pub fn failed(&mut self, error: ResolveError) {
        self.fill(ResolveState::Failed(error));
    }

    pub fn state(&self) -> &ResolveState<T> {
        &self.state
    }

    pub fn into_state(self) -> ResolveState<T> {
        self.state
    }

    pub fn value(&self) -> Option<&T> {
        match &self.state {
            ResolveState::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn value_mut(&mut self) -> Option<&mut T> {
        match &mut self.state {
            ResolveState::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self.state, ResolveState::Missing)
    }

    pub fn failure(&self) -> Option<&ResolveError> {
        match &self.state {
            ResolveState::Failed(error) => Some(error),
            _ => None,
        }
    }

    fn fill(&mut self, state: ResolveState<T>) {
        if self.has_result() {
            tracing::warn!("ignoring second answer for an already resolved result");
            return;
        }
        self.state = state;
    }
}

impl<T> Default for BuildableResult<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unresolved() {
        let result = ModuleVersionListingResult::new();
        assert!(!result.has_result());
        assert_eq!(result.state(), &ResolveState::Unresolved);
        assert!(result.value().is_none());
    }

    #[test]
    fn first_answer_wins() {
        let mut result = ModuleVersionListingResult::new();
        result.resolved(vec!["1.0".to_string()]);
        result.resolved(vec!["2.0".to_string()]);
        result.failed(ResolveError::ChainReleased);

        assert_eq!(result.value(), Some(&vec!["1.0".to_string()]));
        assert!(result.failure().is_none());
    }

    #[test]
    fn missing_counts_as_result() {
        let mut result = ArtifactResult::new();
        result.missing();
        assert!(result.has_result());
        assert!(result.is_missing());

        result.resolved(PathBuf::from("/cache/lib.jar"));
        assert!(result.is_missing());
    }
}
