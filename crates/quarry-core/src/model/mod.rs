//! Resolution data model.
//!
//! Identifiers, dependency and component metadata, artifacts, provenance
//! sources and the write-once result objects that resolution stages fill.

mod result;
mod source;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use result::{
    ArtifactResult, ArtifactSetResult, BuildableResult, ComponentMetadataResult,
    ModuleVersionListingResult, ResolveState,
};
pub use source::{ModuleSource, OpaqueSource, RepositoryChainModuleSource};

/// Stable identity of a configured repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepositoryId(String);

impl RepositoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RepositoryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A module without a version: `group:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleIdentifier {
    pub group: String,
    pub name: String,
}

impl ModuleIdentifier {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ModuleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// A requested module version, possibly dynamic (`1.+`, `latest.release`, `^2.1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleVersionSelector {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl ModuleVersionSelector {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn module(&self) -> ModuleIdentifier {
        ModuleIdentifier::new(self.group.clone(), self.name.clone())
    }
}

impl fmt::Display for ModuleVersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// A concrete module version: `group:module:version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleComponentIdentifier {
    pub group: String,
    pub module: String,
    pub version: String,
}

impl ModuleComponentIdentifier {
    pub fn new(
        group: impl Into<String>,
        module: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            module: module.into(),
            version: version.into(),
        }
    }

    /// The component a selector names when its version is not dynamic.
    pub fn from_selector(selector: &ModuleVersionSelector) -> Self {
        Self::new(
            selector.group.clone(),
            selector.name.clone(),
            selector.version.clone(),
        )
    }
}

impl fmt::Display for ModuleComponentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.module, self.version)
    }
}

/// A declared dependency on a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyMetadata {
    /// Requested module and version selector
    pub requested: ModuleVersionSelector,
    /// Whether the module content may change without a version bump
    pub changing: bool,
    /// Dynamic constraint declared by a legacy descriptor alongside the fixed version
    pub dynamic_constraint: Option<String>,
}

impl DependencyMetadata {
    pub fn new(requested: ModuleVersionSelector) -> Self {
        Self {
            requested,
            changing: false,
            dynamic_constraint: None,
        }
    }

    pub fn changing(mut self) -> Self {
        self.changing = true;
        self
    }

    pub fn with_dynamic_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.dynamic_constraint = Some(constraint.into());
        self
    }

    /// Copy of this dependency requesting a different version.
    pub fn with_requested_version(&self, version: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.requested.version = version.into();
        copy
    }
}

impl fmt::Display for DependencyMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.requested.fmt(f)
    }
}

/// Resolved metadata of one module version.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentMetadata {
    pub id: ModuleComponentIdentifier,
    /// Status from the descriptor (`release`, `integration`, ...)
    pub status: String,
    pub changing: bool,
    pub dependencies: Vec<DependencyMetadata>,
    source: Option<ModuleSource>,
}

impl ComponentMetadata {
    pub fn new(id: ModuleComponentIdentifier) -> Self {
        Self {
            id,
            status: "release".to_string(),
            changing: false,
            dependencies: Vec::new(),
            source: None,
        }
    }

    pub fn with_dependency(mut self, dependency: DependencyMetadata) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn source(&self) -> Option<&ModuleSource> {
        self.source.as_ref()
    }

    /// Copy of this component carrying a different source.
    pub fn with_source(&self, source: Option<ModuleSource>) -> Self {
        Self {
            source,
            ..self.clone()
        }
    }
}

impl fmt::Display for ComponentMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}

/// Kinds of auxiliary artifacts a component can publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactType {
    /// The module descriptor itself
    Descriptor,
    Javadoc,
    Sources,
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactType::Descriptor => write!(f, "descriptor"),
            ArtifactType::Javadoc => write!(f, "javadoc"),
            ArtifactType::Sources => write!(f, "sources"),
        }
    }
}

/// Artifacts requested for use in a configuration of the component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentUsage {
    pub configuration: String,
}

impl ComponentUsage {
    pub fn new(configuration: impl Into<String>) -> Self {
        Self {
            configuration: configuration.into(),
        }
    }
}

impl fmt::Display for ComponentUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "artifacts for configuration '{}'", self.configuration)
    }
}

/// Name of a published file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactName {
    pub name: String,
    /// Artifact type (`jar`, `pom`, `ivy`, ...)
    pub kind: String,
    pub extension: String,
    pub classifier: Option<String>,
}

impl ArtifactName {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            extension: extension.into(),
            classifier: None,
        }
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.classifier {
            Some(classifier) => write!(f, "{}-{}.{}", self.name, classifier, self.extension),
            None => write!(f, "{}.{}", self.name, self.extension),
        }
    }
}

/// An artifact of a resolved component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentArtifactMetadata {
    pub component: ModuleComponentIdentifier,
    pub name: ArtifactName,
}

impl ComponentArtifactMetadata {
    pub fn new(component: ModuleComponentIdentifier, name: ArtifactName) -> Self {
        Self { component, name }
    }
}

impl fmt::Display for ComponentArtifactMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.component)
    }
}
