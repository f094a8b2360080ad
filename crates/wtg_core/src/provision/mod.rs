//! Dependency provisioning.
//!
//! Bootstraps the external tools the pipeline runs: checks the managed
//! bin folder and the system `PATH`, and downloads/installs release
//! archives when a tool is missing.

pub mod archive;
pub mod manifest;
pub mod provisioner;

pub use archive::{ArchiveError, ArchiveKind};
pub use manifest::{ToolDependency, ToolManifest};
pub use provisioner::{
    find_on_path, sha256_file, ProvisionError, Provisioner, ResolvedTool, ToolSource,
};
