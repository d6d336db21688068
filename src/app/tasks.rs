use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::events::UserEvent;
use super::proxy::EventProxy;
use super::state::AppState;

use crate::core::{CoreError, ProjectScanner, ScanProgress};

/// Starts a scan of `path` (or of its parent if `path` is a file).
///
/// Any scan still in flight is cancelled and awaited first, so two scans never
/// overlap. The result arrives later as a `ScanCompleted` or `ScanFailed`
/// event tagged with the new scan generation.
pub async fn start_scan_on_path<P: EventProxy>(
    path: PathBuf,
    proxy: P,
    state: &mut AppState,
) -> Result<(), CoreError> {
    let directory_path = if path.is_dir() {
        path
    } else {
        path.parent().map(|p| p.to_path_buf()).unwrap_or(path)
    };

    if !directory_path.is_dir() {
        proxy.send_event(UserEvent::ShowError(format!(
            "{} is not a valid directory.",
            directory_path.display()
        )));
        return Err(CoreError::NotADirectory(directory_path));
    }

    state.cancel_current_scan().await;

    state.scan_generation += 1;
    let generation = state.scan_generation;
    state.project_path = Some(directory_path.clone());
    if state.config.remember_project_path {
        state.session.last_project_path = directory_path.to_string_lossy().into_owned();
        state.save_session();
    }

    state.is_scanning = true;
    state.scan_progress = ScanProgress {
        entries_found: 0,
        current_scanning_path: "Initializing scan...".to_string(),
    };

    let cancel_flag = Arc::new(AtomicBool::new(false));
    state.scan_cancellation_flag = cancel_flag.clone();

    let scanner = ProjectScanner::new(state.config.scan_options());
    tracing::info!("Spawning scan #{} for {}", generation, directory_path.display());
    let handle = tokio::spawn(async move {
        scan_directory_task(scanner, directory_path, generation, cancel_flag, proxy).await;
    });
    state.scan_task = Some(handle);
    Ok(())
}

/// The background half of a scan: runs the scanner and reports the outcome.
async fn scan_directory_task<P: EventProxy>(
    scanner: ProjectScanner,
    path: PathBuf,
    generation: u64,
    cancel_flag: Arc<AtomicBool>,
    proxy: P,
) {
    let progress_proxy = proxy.clone();
    let progress_callback = move |progress: ScanProgress| {
        progress_proxy.send_event(UserEvent::ScanProgress {
            generation,
            progress,
        });
    };

    match scanner
        .scan_in_background(path, cancel_flag, progress_callback)
        .await
    {
        Ok(batch) => {
            tracing::info!("Scan #{} finished with {} entries.", generation, batch.entries.len());
            proxy.send_event(UserEvent::ScanCompleted { generation, batch });
        }
        Err(CoreError::Cancelled) => {
            tracing::info!("Scan #{} was cancelled; discarding results.", generation);
        }
        Err(e) => {
            tracing::error!("Scan #{} failed: {}", generation, e);
            proxy.send_event(UserEvent::ScanFailed {
                generation,
                message: e.to_string(),
            });
        }
    }
}
