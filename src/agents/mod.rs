pub mod module_updater;
pub mod project_scanner;
pub mod provider_updater;
pub mod report;
pub mod version_control;
pub mod version_file;

pub use module_updater::ModuleUpdater;
pub use project_scanner::{ProjectInfo, ProjectScannerAgent};
pub use provider_updater::ProviderUpdater;
pub use report::{EditKind, UpdateReport};
pub use version_control::VersionControlAgent;
