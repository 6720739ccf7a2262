use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};

use itertools::Itertools;

use crate::assets::blob::BlobHandle;
use crate::assets::error::LoadError;
use crate::assets::model::ModelNode;

pub const MODEL_EXTENSION: &str = "glb";

pub enum AssetSource {
    /// A model from the built-in library, resolved by name under the asset root.
    Named(String),
    /// A model supplied by the user; the blob is released once the load ends.
    Upload { name: String, blob: BlobHandle },
}

impl AssetSource {
    pub fn upload(file_name: &str, blob: BlobHandle) -> Self {
        AssetSource::Upload {
            name: upload_display_name(file_name),
            blob,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AssetSource::Named(name) => name,
            AssetSource::Upload { name, .. } => name,
        }
    }
}

/// `"Saturn Rings"` -> `"saturn_rings.glb"`
pub fn asset_file_name(name: &str) -> String {
    format!(
        "{}.{}",
        name.to_lowercase().split_whitespace().join("_"),
        MODEL_EXTENSION
    )
}

/// File name without its extension, used as the label of uploaded models.
pub fn upload_display_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

#[cfg(test)]
impl LoadTicket {
    pub(crate) fn for_tests(id: u64) -> Self {
        LoadTicket(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    Library,
    Upload,
    /// Warms the cache at startup; the model is not placed.
    Preload,
}

#[derive(Debug)]
pub struct LoadEvent {
    pub ticket: LoadTicket,
    pub name: String,
    pub origin: LoadOrigin,
    pub result: Result<ModelNode, LoadError>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: usize,
    pub total: usize,
}

impl LoadProgress {
    pub fn is_complete(&self) -> bool {
        self.loaded >= self.total
    }

    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.loaded as f32 / self.total as f32
        }
    }

    pub fn label(&self) -> String {
        if self.is_complete() {
            "Ready!".to_string()
        } else {
            format!("Loading asset {} of {}", self.loaded + 1, self.total)
        }
    }
}

/// Loads models on the rayon pool. Results are only observed through `poll`,
/// which the frame loop calls between frames, so each finished model is
/// applied to the scene in one step.
pub struct AssetLoader {
    root: PathBuf,
    next_ticket: u64,
    sender: Sender<LoadEvent>,
    receiver: Receiver<LoadEvent>,
    progress: LoadProgress,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (sender, receiver) = channel();

        Self {
            root: root.into(),
            next_ticket: 0,
            sender,
            receiver,
            progress: LoadProgress::default(),
        }
    }

    pub fn request(&mut self, source: AssetSource) -> LoadTicket {
        let origin = match source {
            AssetSource::Named(_) => LoadOrigin::Library,
            AssetSource::Upload { .. } => LoadOrigin::Upload,
        };

        self.spawn(source, origin)
    }

    pub fn preload(&mut self, names: &[String]) {
        log::info!("Preloading {}", names.iter().join(", "));

        for name in names {
            self.spawn(AssetSource::Named(name.clone()), LoadOrigin::Preload);
        }
    }

    fn spawn(&mut self, source: AssetSource, origin: LoadOrigin) -> LoadTicket {
        if self.progress.is_complete() {
            self.progress = LoadProgress::default();
        }
        self.progress.total += 1;

        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        let root = self.root.clone();
        let sender = self.sender.clone();
        let name = source.name().to_string();

        rayon::spawn(move || {
            let result = load_source(&root, source);

            // The receiver only disappears when the app is shutting down.
            let _ = sender.send(LoadEvent {
                ticket,
                name,
                origin,
                result,
            });
        });

        ticket
    }

    /// Drains finished loads without blocking.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let events: Vec<LoadEvent> = self.receiver.try_iter().collect();
        self.progress.loaded += events.len();
        events
    }

    pub fn progress(&self) -> LoadProgress {
        self.progress
    }
}

/// Synchronous part of a load. Consumes the source, so an upload's blob is
/// released when this returns, whatever the outcome.
pub fn load_source(root: &Path, source: AssetSource) -> Result<ModelNode, LoadError> {
    match source {
        AssetSource::Named(name) => {
            let path = root.join(asset_file_name(&name));
            let bytes = std::fs::read(&path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            ModelNode::from_gltf_slice(&name, &bytes, Some(root))
        }
        AssetSource::Upload { name, blob } => {
            log::debug!("Loading {} from {}", name, blob.reference());
            ModelNode::from_gltf_slice(&name, blob.bytes(), None)
        }
    }
}
