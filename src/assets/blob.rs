use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Registry of transient in-memory files handed to the loader, such as a
/// model picked from disk by the user.
///
/// Each blob lives exactly as long as its `BlobHandle`; dropping the handle
/// releases it. `live_count` reports handles not yet released.
#[derive(Default)]
pub struct BlobStore {
    next_id: u64,
    live: Arc<AtomicUsize>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, bytes: Vec<u8>) -> BlobHandle {
        self.next_id += 1;
        self.live.fetch_add(1, Ordering::AcqRel);

        BlobHandle {
            id: self.next_id,
            bytes: bytes.into(),
            live: self.live.clone(),
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

pub struct BlobHandle {
    id: u64,
    bytes: Arc<[u8]>,
    live: Arc<AtomicUsize>,
}

impl BlobHandle {
    pub fn reference(&self) -> String {
        format!("blob:galaxias/{}", self.id)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for BlobHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
        log::debug!("Released {}", self.reference());
    }
}

impl std::fmt::Debug for BlobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobHandle")
            .field("reference", &self.reference())
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_release_on_drop() {
        let mut store = BlobStore::new();
        let first = store.create(vec![1, 2, 3]);
        let second = store.create(vec![4]);

        assert_eq!(store.live_count(), 2);
        assert_ne!(first.reference(), second.reference());
        assert_eq!(first.bytes(), &[1, 2, 3]);

        drop(first);
        assert_eq!(store.live_count(), 1);
        drop(second);
        assert_eq!(store.live_count(), 0);
    }
}
