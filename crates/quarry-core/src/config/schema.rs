//! Configuration schema for quarry.toml

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::CachePolicy;
use crate::model::RepositoryId;
use crate::repository::ResolutionOverride;

/// Root configuration structure for quarry.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuarryConfig {
    /// Build-wide resolution switches
    #[serde(default)]
    pub resolution: ResolutionOverride,

    /// Cache expiry
    #[serde(default)]
    pub cache: CachePolicy,

    /// Declared repositories, in resolution order
    #[serde(default, rename = "repository")]
    pub repositories: Vec<RepositoryConfig>,
}

/// A `[[repository]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub id: RepositoryId,

    #[serde(default = "default_repository_kind")]
    pub kind: RepositoryKind,

    /// Directory of a local repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Base URL of a remote repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,

    /// Descriptors are resolved by a legacy engine
    #[serde(default)]
    pub legacy: bool,

    /// Resolve the dynamic constraints declared in descriptors
    #[serde(default)]
    pub dynamic_resolve: bool,
}

fn default_repository_kind() -> RepositoryKind {
    RepositoryKind::Remote
}

/// Repository kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepositoryKind {
    /// Filesystem repository; never blocks on the network
    Local,
    /// Network repository
    Remote,
}

impl RepositoryConfig {
    pub fn local(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: RepositoryId::new(id),
            kind: RepositoryKind::Local,
            path: Some(path.into()),
            url: None,
            legacy: false,
            dynamic_resolve: false,
        }
    }

    pub fn remote(id: impl Into<String>, url: Url) -> Self {
        Self {
            id: RepositoryId::new(id),
            kind: RepositoryKind::Remote,
            path: None,
            url: Some(url),
            legacy: false,
            dynamic_resolve: false,
        }
    }

    pub fn is_local(&self) -> bool {
        self.kind == RepositoryKind::Local
    }

    /// Validate configuration based on repository kind
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.id.as_str().trim().is_empty() {
            anyhow::bail!("Repository id must not be empty");
        }
        match self.kind {
            RepositoryKind::Local => {
                if self.path.is_none() {
                    anyhow::bail!("Local repository '{}' requires 'path' field", self.id);
                }
            }
            RepositoryKind::Remote => {
                if self.url.is_none() {
                    anyhow::bail!("Remote repository '{}' requires 'url' field", self.id);
                }
            }
        }
        Ok(())
    }

    /// Where the repository lives, for display purposes
    pub fn location(&self) -> String {
        match self.kind {
            RepositoryKind::Local => self
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            RepositoryKind::Remote => self
                .url
                .as_ref()
                .map(|u| u.to_string())
                .unwrap_or_default(),
        }
    }
}

impl QuarryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for repository in &self.repositories {
            repository.validate()?;
            if !seen.insert(&repository.id) {
                anyhow::bail!("Repository '{}' is declared more than once", repository.id);
            }
        }
        Ok(())
    }

    pub fn repository(&self, id: &str) -> Option<&RepositoryConfig> {
        self.repositories.iter().find(|r| r.id.as_str() == id)
    }
}
