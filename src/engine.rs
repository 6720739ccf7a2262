use std::path::Path;
use std::time::Instant;

use anyhow::Context;

use crate::{
    assets::{loader::LoadTicket, AssetLoader, AssetSource, BlobStore},
    editor::EditorSession,
};

/// One frame of simulation: applies finished loads, then advances drags,
/// animation and the camera.
pub fn update(session: &mut EditorSession, loader: &mut AssetLoader, now: Instant) {
    for event in loader.poll() {
        session.apply_load_event(event);
    }

    session.tick(now);
    session.scene.late_update();
}

/// Reads a model file from disk into a blob and queues it as an upload.
pub fn load_custom_model(
    loader: &mut AssetLoader,
    blobs: &mut BlobStore,
    path: &Path,
) -> anyhow::Result<LoadTicket> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read model file {}", path.display()))?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} is not a file", path.display()))?;

    let blob = blobs.create(bytes);
    log::info!("Uploading {} as {}", file_name, blob.reference());

    Ok(loader.request(AssetSource::upload(&file_name, blob)))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::config::SandboxConfig;

    fn run_until_loaded(session: &mut EditorSession, loader: &mut AssetLoader) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !loader.progress().is_complete() && Instant::now() < deadline {
            update(session, loader, Instant::now());
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn missing_library_model_alerts_without_touching_scene() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = AssetLoader::new(dir.path());
        let mut session =
            EditorSession::with_rng(SandboxConfig::default(), StdRng::seed_from_u64(3));

        loader.request(AssetSource::Named("Pluto".to_string()));
        run_until_loaded(&mut session, &mut loader);

        assert!(session.scene.roots().is_empty());
        assert_eq!(session.take_alerts(), vec!["Could not load Pluto model."]);
    }

    #[test]
    fn invalid_custom_model_releases_blob() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rock.glb");
        std::fs::write(&path, b"not a model").unwrap();

        let mut loader = AssetLoader::new(dir.path());
        let mut blobs = BlobStore::new();
        let mut session =
            EditorSession::with_rng(SandboxConfig::default(), StdRng::seed_from_u64(3));

        load_custom_model(&mut loader, &mut blobs, &path).unwrap();
        run_until_loaded(&mut session, &mut loader);

        assert_eq!(blobs.live_count(), 0);
        assert!(session.scene.roots().is_empty());
        assert_eq!(session.take_alerts(), vec!["Could not load custom model."]);
    }

    #[test]
    fn unreadable_custom_model_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = AssetLoader::new(dir.path());
        let mut blobs = BlobStore::new();

        let result = load_custom_model(&mut loader, &mut blobs, &dir.path().join("missing.glb"));

        assert!(result.is_err());
        assert_eq!(blobs.live_count(), 0);
        assert!(loader.progress().is_complete());
    }
}
