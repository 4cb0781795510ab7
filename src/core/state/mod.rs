mod settings;

pub use settings::{default_launcher_root, InstallerConfig, LoaderEndpoints};
