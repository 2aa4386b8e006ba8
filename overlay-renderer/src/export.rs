//! Export pipeline.
//!
//! Compositing, encoding and the storage write all run on a blocking worker.
//! Once spawned, an export always finishes: the task is never aborted, and
//! dropping its handle only detaches it. Exactly one completion action is sent
//! back to the session's inbox, even if compositing or storage panics.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use overlay_core::{Action, ExportRequest, Persistence, SaveError};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::compositor::Compositor;
use crate::error::RenderResult;

/// Composite `request` and hand it to `persistence`.
///
/// Returns the storage reference.
///
/// # Errors
///
/// Returns an error if compositing fails, the save fails, or storage returns
/// an empty reference.
pub fn export_blocking(
    request: &ExportRequest,
    compositor: &Compositor,
    persistence: &dyn Persistence,
) -> RenderResult<String> {
    let composite = compositor.compose_final(request)?;
    let reference = persistence.save(&composite, &request.folder_name)?;
    if reference.trim().is_empty() {
        return Err(SaveError::EmptyReference.into());
    }
    Ok(reference)
}

/// Run an export on the blocking pool and report the outcome to `completions`.
///
/// Must be called from within a tokio runtime.
pub fn spawn_export(
    request: ExportRequest,
    compositor: Arc<Compositor>,
    persistence: Arc<dyn Persistence>,
    completions: UnboundedSender<Action>,
) -> JoinHandle<()> {
    info!(
        elements = request.elements.len(),
        folder = %request.folder_name,
        "export started"
    );

    tokio::task::spawn_blocking(move || {
        let result = catch_unwind(AssertUnwindSafe(|| {
            export_blocking(&request, &compositor, persistence.as_ref())
        }));
        let outcome = match result {
            Ok(Ok(reference)) => {
                info!(%reference, "export saved");
                Action::ExportCompleted(reference)
            }
            Ok(Err(e)) => {
                error!(error = %e, "export failed");
                Action::ExportFailed(e.to_string())
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                error!(%reason, "export worker panicked");
                Action::ExportFailed(format!("export aborted: {reason}"))
            }
        };
        if completions.send(outcome).is_err() {
            error!("session gone before export completion could be delivered");
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::DefaultResolver;
    use overlay_core::{ColorRef, RasterHandle, SessionConfig};
    use std::sync::Mutex;

    struct Recording {
        reference: String,
        saved: Mutex<Vec<(u32, u32, String)>>,
    }

    impl Persistence for Recording {
        fn save(&self, raster: &RasterHandle, folder_name: &str) -> Result<String, SaveError> {
            if let Ok(mut saved) = self.saved.lock() {
                saved.push((raster.width(), raster.height(), folder_name.to_string()));
            }
            Ok(self.reference.clone())
        }
    }

    fn compositor() -> Compositor {
        Compositor::new(
            Arc::new(SessionConfig::default().with_canvas_size(16, 16)),
            Arc::new(DefaultResolver::with_fonts(usvg::fontdb::Database::new())),
        )
    }

    fn request() -> ExportRequest {
        ExportRequest {
            frame: RasterHandle::solid(4, 4, ColorRef::WHITE),
            composited_background: RasterHandle::solid(16, 16, ColorRef::rgba(0, 0, 0, 0)),
            elements: Vec::new(),
            folder_name: "Trips".to_string(),
        }
    }

    #[test]
    fn test_export_blocking_saves_canvas_sized_composite() {
        let store = Recording {
            reference: "mem://1".to_string(),
            saved: Mutex::new(Vec::new()),
        };
        let reference = export_blocking(&request(), &compositor(), &store).expect("export");
        assert_eq!(reference, "mem://1");
        let saved = store.saved.lock().expect("lock");
        assert_eq!(saved.as_slice(), &[(16, 16, "Trips".to_string())]);
    }

    #[test]
    fn test_empty_reference_is_an_error() {
        let store = Recording {
            reference: String::new(),
            saved: Mutex::new(Vec::new()),
        };
        let err = export_blocking(&request(), &compositor(), &store).expect_err("empty");
        assert!(err.to_string().contains("empty reference"));
    }

    #[tokio::test]
    async fn test_spawn_export_sends_one_completion() {
        let store: Arc<dyn Persistence> = Arc::new(Recording {
            reference: "mem://2".to_string(),
            saved: Mutex::new(Vec::new()),
        });
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        spawn_export(request(), Arc::new(compositor()), store, tx)
            .await
            .expect("join");

        assert_eq!(rx.recv().await, Some(Action::ExportCompleted("mem://2".into())));
        assert_eq!(rx.recv().await, None);
    }

    struct Exploding;

    impl Persistence for Exploding {
        fn save(&self, _raster: &RasterHandle, _folder_name: &str) -> Result<String, SaveError> {
            panic!("disk on fire");
        }
    }

    #[tokio::test]
    async fn test_panicking_store_still_reports_failure() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        spawn_export(request(), Arc::new(compositor()), Arc::new(Exploding), tx)
            .await
            .expect("join");

        match rx.recv().await {
            Some(Action::ExportFailed(reason)) => assert!(reason.contains("disk on fire")),
            other => panic!("expected ExportFailed, got {other:?}"),
        }
        assert_eq!(rx.recv().await, None);
    }
}
