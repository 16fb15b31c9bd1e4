//! Single-flight background removal.
//!
//! The model itself is external; this gate guarantees at most one removal
//! runs at a time. A second request while one is in flight is rejected
//! immediately instead of queued.

use async_trait::async_trait;
use printkit_core::{BackgroundRemovalError, ProgressCallback};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// An image-to-image model that strips the background of `src`
#[async_trait]
pub trait BackgroundRemovalModel: Send + Sync {
    /// Returns the processed image as a PNG data URL. `progress` receives
    /// (current, total) updates.
    async fn remove_background(
        &self,
        src: &str,
        progress: &ProgressCallback,
    ) -> Result<String, BackgroundRemovalError>;
}

/// Clears the in-flight flag however the task ends
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Single-flight gate around a [`BackgroundRemovalModel`]
#[derive(Clone)]
pub struct BackgroundRemover {
    model: Arc<dyn BackgroundRemovalModel>,
    processing: Arc<AtomicBool>,
}

impl BackgroundRemover {
    pub fn new(model: Arc<dyn BackgroundRemovalModel>) -> Self {
        Self {
            model,
            processing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Start a removal on the tokio runtime.
    ///
    /// Fails with [`BackgroundRemovalError::AlreadyProcessing`] without
    /// spawning anything when a removal is already running.
    pub fn remove(
        &self,
        src: impl Into<String>,
        progress: Option<ProgressCallback>,
    ) -> Result<JoinHandle<Result<String, BackgroundRemovalError>>, BackgroundRemovalError> {
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("Background removal requested while one is in flight");
            return Err(BackgroundRemovalError::AlreadyProcessing);
        }

        let guard = InFlight(self.processing.clone());
        let model = self.model.clone();
        let src = src.into();
        let progress: ProgressCallback = progress.unwrap_or_else(|| Box::new(|_, _| {}));

        Ok(tokio::spawn(async move {
            let _guard = guard;
            tracing::info!("Background removal started");
            let result = model.remove_background(&src, &progress).await;
            match &result {
                Ok(_) => tracing::info!("Background removal finished"),
                Err(err) => tracing::warn!("Background removal failed: {}", err),
            }
            result
        }))
    }
}

impl std::fmt::Debug for BackgroundRemover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundRemover")
            .field("processing", &self.is_processing())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use tokio::sync::Notify;

    struct GatedModel {
        release: Arc<Notify>,
        fail: bool,
    }

    #[async_trait]
    impl BackgroundRemovalModel for GatedModel {
        async fn remove_background(
            &self,
            src: &str,
            progress: &ProgressCallback,
        ) -> Result<String, BackgroundRemovalError> {
            progress(1, 2);
            self.release.notified().await;
            progress(2, 2);
            if self.fail {
                Err(BackgroundRemovalError::Failed {
                    reason: "model crashed".to_string(),
                })
            } else {
                Ok(format!("{}#cutout", src))
            }
        }
    }

    fn remover(fail: bool) -> (BackgroundRemover, Arc<Notify>) {
        let release = Arc::new(Notify::new());
        let model = GatedModel {
            release: release.clone(),
            fail,
        };
        (BackgroundRemover::new(Arc::new(model)), release)
    }

    #[tokio::test]
    async fn test_second_call_is_rejected_while_in_flight() {
        let (remover, release) = remover(false);
        let last_progress = Arc::new(AtomicU64::new(0));
        let sink = last_progress.clone();

        let handle = remover
            .remove(
                "data:image/png;base64,AAAA",
                Some(Box::new(move |current, _total| {
                    sink.store(current, Ordering::SeqCst);
                })),
            )
            .unwrap();
        assert!(remover.is_processing());
        assert_eq!(
            remover.remove("other", None).unwrap_err(),
            BackgroundRemovalError::AlreadyProcessing
        );

        release.notify_one();
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result, "data:image/png;base64,AAAA#cutout");
        assert_eq!(last_progress.load(Ordering::SeqCst), 2);
        assert!(!remover.is_processing());
    }

    #[tokio::test]
    async fn test_failure_resets_flag() {
        let (remover, release) = remover(true);
        let handle = remover.remove("img.png", None).unwrap();
        release.notify_one();
        assert!(matches!(
            handle.await.unwrap(),
            Err(BackgroundRemovalError::Failed { .. })
        ));
        assert!(!remover.is_processing());
        assert!(remover.remove("img.png", None).is_ok());
    }
}
