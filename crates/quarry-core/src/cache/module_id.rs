//! Cache keys for version listings.

use serde::{Deserialize, Serialize};

use crate::model::{ModuleIdentifier, ModuleVersionSelector};

/// How the caching decorator keys version listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleIdExtractor {
    /// One listing per module; the repository returns complete listings.
    PerModule,
    /// One listing per requested version. Legacy engines only list what
    /// matches the request, so a listing must never answer another selector.
    PerVersion,
}

impl ModuleIdExtractor {
    pub fn extract(&self, selector: &ModuleVersionSelector) -> ModuleIdentifier {
        match self {
            ModuleIdExtractor::PerModule => selector.module(),
            ModuleIdExtractor::PerVersion => ModuleIdentifier::new(
                selector.group.clone(),
                format!("{}:{}", selector.name, selector.version),
            ),
        }
    }
}
