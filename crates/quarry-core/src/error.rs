//! Resolution error taxonomy.

use thiserror::Error;

use crate::model::RepositoryId;

/// Errors raised while dispatching resolution requests through a repository chain.
///
/// Session-integrity errors (see [`ResolveError::is_fatal`]) indicate a
/// programming or configuration mistake and are never retried. Everything else
/// originates in a collaborator and is propagated unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A provenance tag names a repository that is not part of the current chain.
    #[error("attempting to resolve artifacts from invalid repository '{0}'")]
    UnknownRepository(RepositoryId),

    /// The value carries no repository-chain source.
    #[error("{0} was not resolved through a repository chain")]
    UntaggedSource(String),

    /// Two repositories with the same identity were registered in one chain.
    #[error("repository '{0}' is registered more than once")]
    DuplicateRepository(RepositoryId),

    /// The aggregate chain was dropped while a lookup still referenced it.
    #[error("repository chain is no longer available")]
    ChainReleased,

    /// Remote access was attempted while resolution runs offline.
    #[error("No cached version of {0} available for offline mode")]
    Offline(String),

    /// A transport collaborator failed.
    #[error("could not resolve {target} using repository {repository}: {message}")]
    Transport {
        /// Repository the request was sent to
        repository: String,
        /// Dependency, component or artifact being resolved
        target: String,
        /// Failure reported by the transport
        message: String,
    },
}

impl ResolveError {
    /// Whether this error signals a broken session rather than a failed lookup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnknownRepository(_)
                | Self::UntaggedSource(_)
                | Self::DuplicateRepository(_)
                | Self::ChainReleased
        )
    }

    /// Failure reported by the transport behind `repository` for `target`.
    pub fn transport(
        repository: impl Into<String>,
        target: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        Self::Transport {
            repository: repository.into(),
            target: target.to_string(),
            message: message.into(),
        }
    }
}
