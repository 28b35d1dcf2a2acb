//! Progress-callback trait for per-item tool events.
//!
//! An "item" is whatever a tool iterates over: input files for merge and
//! image→PDF, output parts for split, pages for rendering and OCR.
//! Inject an [`Arc<dyn ToolProgressCallback>`] via
//! [`crate::config::ToolConfigBuilder::progress_callback`].
//!
//! # Example
//!
//! ```rust
//! use pdftools::{ToolConfig, ToolProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ToolProgressCallback for CountingCallback {
//!     fn on_item_complete(&self, item: usize, total: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{item}/{total} done");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ToolConfig::builder()
//!     .progress_callback(counter as Arc<dyn ToolProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the tools as they work through their items.
///
/// All methods have default no-op implementations. During OCR the per-item
/// methods may be called concurrently from different tasks, so shared state
/// needs `Mutex` or atomics.
pub trait ToolProgressCallback: Send + Sync {
    /// Called once before the first item.
    ///
    /// * `tool`  — short tool name, e.g. `"merge"` or `"ocr"`
    /// * `total` — number of items that will be processed
    fn on_start(&self, tool: &str, total: usize) {
        let _ = (tool, total);
    }

    /// `item` is 1-indexed.
    fn on_item_start(&self, item: usize, total: usize) {
        let _ = (item, total);
    }

    fn on_item_complete(&self, item: usize, total: usize) {
        let _ = (item, total);
    }

    /// Called when an item fails but the tool carries on (OCR pages only).
    fn on_item_error(&self, item: usize, total: usize, error: &str) {
        let _ = (item, total, error);
    }

    /// Called once after every item has been attempted.
    fn on_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ToolProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ToolConfig`].
pub type ProgressCallback = Arc<dyn ToolProgressCallback>;

/// Resolve the configured callback, falling back to [`NoopProgressCallback`].
pub(crate) fn resolve(cb: &Option<ProgressCallback>) -> ProgressCallback {
    cb.clone()
        .unwrap_or_else(|| Arc::new(NoopProgressCallback) as ProgressCallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        tool: Mutex<String>,
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        success: AtomicUsize,
    }

    impl ToolProgressCallback for TrackingCallback {
        fn on_start(&self, tool: &str, _total: usize) {
            *self.tool.lock().unwrap() = tool.to_string();
        }

        fn on_item_start(&self, _item: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_item_complete(&self, _item: usize, _total: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_item_error(&self, _item: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_complete(&self, _total: usize, success_count: usize) {
            self.success.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_start("merge", 2);
        cb.on_item_start(1, 2);
        cb.on_item_complete(1, 2);
        cb.on_item_error(2, 2, "boom");
        cb.on_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_start("ocr", 3);
        for page in 1..=3 {
            tracker.on_item_start(page, 3);
        }
        tracker.on_item_complete(1, 3);
        tracker.on_item_complete(2, 3);
        tracker.on_item_error(3, 3, "timeout");
        tracker.on_complete(3, 2);

        assert_eq!(*tracker.tool.lock().unwrap(), "ocr");
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.success.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn resolve_falls_back_to_noop() {
        let cb = resolve(&None);
        cb.on_start("split", 1);
    }
}
