//! Shared filesystem response shapes.

use serde::Deserialize;

/// Lifecycle policy applied once after creation.
pub const LIFECYCLE_POLICY: &str = "TransitionToIA=AFTER_30_DAYS";

/// State reported while a new filesystem is being provisioned.
pub const CREATING: &str = "creating";

/// `describe-file-systems` output.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeFileSystems {
    #[serde(default)]
    pub file_systems: Vec<FileSystemDescription>,
}

/// One filesystem, also the output of `create-file-system`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileSystemDescription {
    pub file_system_id: String,
    #[serde(default)]
    pub life_cycle_state: Option<String>,
}

impl FileSystemDescription {
    #[must_use]
    pub fn is_creating(&self) -> bool {
        self.life_cycle_state.as_deref() == Some(CREATING)
    }
}

impl DescribeFileSystems {
    #[must_use]
    pub fn first(self) -> Option<FileSystemDescription> {
        self.file_systems.into_iter().next()
    }
}
