//! Upload progress reporting for attachment uploads.
//!
//! Progress is an integer percentage. When the upload size is known it is
//! `loaded / total`; otherwise a sawtooth estimate cycles over a fixed window
//! so the caller still sees movement. `None` is reported when no sensible
//! figure exists (a known total of zero bytes).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};

/// Window of the sawtooth estimate used when the total size is unknown.
pub const UNKNOWN_TOTAL_WINDOW: u64 = 5 * 1024 * 1024;

/// Size of the chunks attachment bodies are streamed in.
const CHUNK_SIZE: usize = 64 * 1024;

/// Callback receiving upload progress.
pub type ProgressFn = Arc<dyn Fn(Option<u8>) + Send + Sync>;

/// Percentage of an upload, see the module docs.
pub fn upload_percent(loaded: u64, total: Option<u64>) -> Option<u8> {
    match total {
        Some(0) => None,
        Some(total) => {
            let percent = (loaded as f64 * 100.0 / total as f64).round();
            Some(percent.clamp(0.0, 100.0) as u8)
        }
        None => {
            let position = (loaded % UNKNOWN_TOTAL_WINDOW) as f64 / UNKNOWN_TOTAL_WINDOW as f64;
            Some((position * 100.0).round().clamp(1.0, 99.0) as u8)
        }
    }
}

/// Shared byte counter for one upload, reporting to an optional callback.
#[derive(Clone)]
pub struct ProgressTracker {
    loaded: Arc<AtomicU64>,
    total: Option<u64>,
    callback: Option<ProgressFn>,
}

impl ProgressTracker {
    pub fn new(total: Option<u64>, callback: Option<ProgressFn>) -> Self {
        Self {
            loaded: Arc::new(AtomicU64::new(0)),
            total,
            callback,
        }
    }

    pub fn loaded(&self) -> u64 {
        self.loaded.load(Ordering::Relaxed)
    }

    /// Record `bytes` more sent and notify the callback.
    pub fn advance(&self, bytes: u64) {
        let loaded = self.loaded.fetch_add(bytes, Ordering::Relaxed) + bytes;
        if let Some(ref callback) = self.callback {
            callback(upload_percent(loaded, self.total));
        }
    }

    /// Stream `data` in chunks, advancing the tracker as each chunk is pulled.
    pub fn track(
        &self,
        data: Vec<u8>,
    ) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> + Send + Sync + 'static {
        let tracker = self.clone();
        let chunks: Vec<Vec<u8>> = data.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect();
        stream::iter(chunks).map(move |chunk| {
            tracker.advance(chunk.len() as u64);
            Ok(chunk)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_known_total() {
        assert_eq!(upload_percent(500, Some(1000)), Some(50));
        assert_eq!(upload_percent(0, Some(1000)), Some(0));
        assert_eq!(upload_percent(1000, Some(1000)), Some(100));
        assert_eq!(upload_percent(1, Some(3)), Some(33));
        assert_eq!(upload_percent(2, Some(3)), Some(67));
        // Never above 100 even if more bytes than announced went out
        assert_eq!(upload_percent(1500, Some(1000)), Some(100));
    }

    #[test]
    fn test_zero_total_has_no_percentage() {
        assert_eq!(upload_percent(0, Some(0)), None);
        assert_eq!(upload_percent(10, Some(0)), None);
    }

    #[test]
    fn test_unknown_total_stays_strictly_inside_range() {
        for loaded in [
            0,
            1,
            UNKNOWN_TOTAL_WINDOW / 2,
            UNKNOWN_TOTAL_WINDOW - 1,
            UNKNOWN_TOTAL_WINDOW,
            3 * UNKNOWN_TOTAL_WINDOW + 17,
            u64::MAX,
        ] {
            let percent = upload_percent(loaded, None).unwrap();
            assert!(percent > 0 && percent < 100, "loaded {} gave {}", loaded, percent);
        }
        assert_eq!(upload_percent(UNKNOWN_TOTAL_WINDOW / 2, None), Some(50));
    }

    #[tokio::test]
    async fn test_tracked_stream_reports_progress() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: ProgressFn = Arc::new(move |p: Option<u8>| sink.lock().unwrap().push(p));

        let data = vec![7u8; CHUNK_SIZE * 2];
        let tracker = ProgressTracker::new(Some(data.len() as u64 * 2), Some(callback));
        let chunks: Vec<_> = tracker.track(data).collect().await;

        assert_eq!(chunks.len(), 2);
        assert_eq!(tracker.loaded(), (CHUNK_SIZE * 2) as u64);
        assert_eq!(*seen.lock().unwrap(), vec![Some(25), Some(50)]);
    }
}
