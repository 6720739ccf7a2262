pub mod blob;
pub mod error;
pub mod loader;
pub mod model;

pub use blob::BlobStore;
pub use error::LoadError;
pub use loader::{AssetLoader, AssetSource, LoadEvent, LoadOrigin, LoadProgress};
pub use model::ModelNode;
