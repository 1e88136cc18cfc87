//! # Resource Cache
//!
//! A content-addressed, bounded, in-process map from opaque URI to
//! `EncodedFrame`. The sole handoff between frame producers (capture
//! backends, stream sessions) and frame readers (`resources/read`, WS
//! binary triplet, auto-push notifications).
//!
//! Eviction is strict insertion-order LRU: the oldest entry is evicted when
//! an insert would exceed capacity.

use crate::error::{CaptureError, CaptureResult};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::sync::RwLock;
use std::collections::HashMap;

/// MIME type of an encoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mime {
    Png,
    Jpeg,
}

impl Mime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mime::Png => "image/png",
            Mime::Jpeg => "image/jpeg",
        }
    }
}

/// Metadata accompanying an encoded frame in the cache.
#[derive(Debug, Clone)]
pub struct FrameMetadata {
    pub width: u32,
    pub height: u32,
    pub quality: u32,
    pub captured_at_unix_ms: u64,
    pub source: String,
}

/// An immutable encoded frame, ready to be served as a resource.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub bytes: Vec<u8>,
    pub mime: Mime,
    pub metadata: FrameMetadata,
}

/// One entry in the cache: the URI it's addressed by, plus its frame.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub uri: String,
    pub frame: EncodedFrame,
}

struct Inner {
    map: HashMap<String, EncodedFrame>,
    order: VecDeque<String>,
    capacity: usize,
}

/// Bounded LRU-by-insertion resource cache. Cheap to clone via `Arc` at the
/// call site; internally guarded by a single `RwLock` (many readers, one
/// writer).
pub struct ResourceCache {
    inner: RwLock<Inner>,
}

impl ResourceCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                map: HashMap::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
                capacity,
            }),
        }
    }

    /// Derive the opaque URI for a captured frame from its identifying
    /// coordinates. Collisions under normal capture rates are negligible:
    /// the digest mixes a nanosecond timestamp with the source and
    /// dimensions.
    pub fn derive_uri(monotonic_capture_ns: u128, source: &str, width: u32, height: u32) -> String {
        let mut hasher = Sha256::new();
        hasher.update(monotonic_capture_ns.to_le_bytes());
        hasher.update(source.as_bytes());
        hasher.update(width.to_le_bytes());
        hasher.update(height.to_le_bytes());
        let digest = hasher.finalize();
        format!("screen://capture/{}", hex12(&digest))
    }

    /// Insert an encoded frame, evicting the oldest entry if this insert
    /// would exceed capacity. Returns the frame's URI.
    pub fn insert(&self, uri: String, frame: EncodedFrame) -> String {
        let mut inner = self.inner.write().unwrap();
        if !inner.map.contains_key(&uri) {
            inner.order.push_back(uri.clone());
        }
        inner.map.insert(uri.clone(), frame);
        while inner.map.len() > inner.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
            } else {
                break;
            }
        }
        uri
    }

    /// Fetch an entry by URI. Never observes a torn value: readers only ever
    /// see a complete `EncodedFrame` or a cache miss.
    pub fn get(&self, uri: &str) -> CaptureResult<EncodedFrame> {
        let inner = self.inner.read().unwrap();
        inner
            .map
            .get(uri)
            .cloned()
            .ok_or_else(|| CaptureError::not_found(uri))
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().unwrap().capacity
    }

    /// List the URIs currently resident, oldest first.
    pub fn list_uris(&self) -> Vec<String> {
        self.inner.read().unwrap().order.iter().cloned().collect()
    }
}

fn hex12(digest: &[u8]) -> String {
    digest[..6]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> EncodedFrame {
        EncodedFrame {
            bytes: vec![1, 2, 3, 4],
            mime: Mime::Png,
            metadata: FrameMetadata {
                width: 10,
                height: 10,
                quality: 85,
                captured_at_unix_ms: 0,
                source: "display:0".to_string(),
            },
        }
    }

    #[test]
    fn test_insert_and_get_round_trip() {
        let cache = ResourceCache::new(4);
        let uri = ResourceCache::derive_uri(1, "display:0", 10, 10);
        cache.insert(uri.clone(), sample_frame());
        let fetched = cache.get(&uri).unwrap();
        assert_eq!(fetched.bytes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_uri_format() {
        let uri = ResourceCache::derive_uri(42, "display:0", 1920, 1080);
        assert!(uri.starts_with("screen://capture/"));
        let id = uri.strip_prefix("screen://capture/").unwrap();
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
    }

    #[test]
    fn test_eviction_is_strictly_lru() {
        let cache = ResourceCache::new(2);
        cache.insert("a".to_string(), sample_frame());
        cache.insert("b".to_string(), sample_frame());
        cache.insert("c".to_string(), sample_frame());

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_err());
        assert!(cache.get("b").is_ok());
        assert!(cache.get("c").is_ok());
    }

    #[test]
    fn test_miss_returns_not_found() {
        let cache = ResourceCache::new(4);
        let err = cache.get("screen://capture/000000000000").unwrap_err();
        assert_eq!(err.category(), "not_found");
    }
}
