mod index;
mod modrinth;
mod release;

pub use index::GameVersionIndex;
pub use modrinth::{CatalogClient, ModrinthCatalog};
pub use release::{FileHashes, ReleaseChannel, ReleaseFile, ReleaseRecord};
