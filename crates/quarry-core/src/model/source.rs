//! Module source provenance types.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::ResolveError;

use super::RepositoryId;

/// Where a resolved component or artifact came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleSource {
    /// Tagged by the aggregate chain with the repository that produced the value
    Chain(RepositoryChainModuleSource),
    /// Produced by a single repository and meaningful only to it
    Opaque(OpaqueSource),
}

impl ModuleSource {
    /// Wrap a repository-private value.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Self::Opaque(OpaqueSource::new(value))
    }

    /// Tag a delegate source with the repository that produced it.
    pub fn chain(repository_id: RepositoryId, delegate: Option<ModuleSource>) -> Self {
        Self::Chain(RepositoryChainModuleSource {
            repository_id,
            delegate: delegate.map(Box::new),
        })
    }

    pub fn as_chain(&self) -> Option<&RepositoryChainModuleSource> {
        match self {
            Self::Chain(source) => Some(source),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&OpaqueSource> {
        match self {
            Self::Opaque(source) => Some(source),
            _ => None,
        }
    }

    /// Recover the chain tag from the source of `subject`.
    ///
    /// Fails when the source is absent or was never tagged by a chain.
    pub fn unpack<'a>(
        source: Option<&'a ModuleSource>,
        subject: &dyn fmt::Display,
    ) -> Result<&'a RepositoryChainModuleSource, ResolveError> {
        source
            .and_then(ModuleSource::as_chain)
            .ok_or_else(|| ResolveError::UntaggedSource(subject.to_string()))
    }
}

/// The repository-chain shape of a [`ModuleSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryChainModuleSource {
    repository_id: RepositoryId,
    delegate: Option<Box<ModuleSource>>,
}

impl RepositoryChainModuleSource {
    pub fn repository_id(&self) -> &RepositoryId {
        &self.repository_id
    }

    /// The source as originally produced by the owning repository.
    pub fn delegate(&self) -> Option<&ModuleSource> {
        self.delegate.as_deref()
    }
}

/// A repository-private source value.
///
/// Clones share the same underlying value; equality is identity.
#[derive(Clone)]
pub struct OpaqueSource(Arc<dyn Any + Send + Sync>);

impl OpaqueSource {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Whether both handles refer to the same value.
    pub fn same_as(&self, other: &OpaqueSource) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for OpaqueSource {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl fmt::Debug for OpaqueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OpaqueSource(..)")
    }
}
