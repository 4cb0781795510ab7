pub mod fabric;
pub mod installer;
pub mod resolver;

pub use fabric::FabricDialect;
pub use installer::{LoaderInstaller, StagedProfile};
pub use resolver::{resolve_loader, LoaderKind, LoaderProfile};
