//! Registry reload worker.
//!
//! Reloads run one at a time on a single task, always from the configured
//! registry path. Requests that queue up while a reload is running collapse
//! into one follow-up reload.

use pro_qualifier_core::RegistryHandle;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Queue depth for pending reload signals; extra signals are redundant.
pub const RELOAD_QUEUE_DEPTH: usize = 1;

pub fn reload_channel() -> (mpsc::Sender<()>, mpsc::Receiver<()>) {
    mpsc::channel(RELOAD_QUEUE_DEPTH)
}

/// Run until every sender is dropped.
pub async fn run_reload_worker(
    registry: Arc<RegistryHandle>,
    path: PathBuf,
    mut requests: mpsc::Receiver<()>,
) {
    while requests.recv().await.is_some() {
        while requests.try_recv().is_ok() {}

        let handle = registry.clone();
        let reload_path = path.clone();
        let outcome =
            tokio::task::spawn_blocking(move || handle.reload_from(Some(reload_path.as_path())))
                .await;

        let path_str = path.display().to_string();
        match outcome {
            Ok(Ok(snapshot)) => {
                info!("Registry reload from {} complete: {} records", path_str, snapshot.len())
            }
            Ok(Err(e)) => error!(
                "Registry reload from {} failed, keeping current snapshot: {}",
                path_str, e
            ),
            Err(e) => error!("Registry reload task failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pro_qualifier_core::Registry;
    use std::fs;

    const HEADER: &str =
        "name,league,sport,date_of_birth,external_id,external_id_kind,proof_url\n";

    fn row(name: &str) -> String {
        format!(
            "{},NBA,Basketball,,{},P3647,https://www.wikidata.org/wiki/Q1\n",
            name,
            name.to_lowercase()
        )
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("lead_qualifier_{}_{}", std::process::id(), name))
    }

    #[tokio::test]
    async fn test_worker_reloads_configured_path() {
        let path = temp_path("worker.csv");
        fs::write(&path, format!("{}{}", HEADER, row("Kobe Bryant"))).unwrap();

        let registry = Arc::new(RegistryHandle::new(Registry::empty()));
        let (tx, rx) = reload_channel();
        let worker = tokio::spawn(run_reload_worker(registry.clone(), path.clone(), rx));

        tx.send(()).await.unwrap();
        drop(tx);
        worker.await.unwrap();

        assert_eq!(registry.snapshot().len(), 1);
        assert_eq!(registry.snapshot().source_path(), Some(path.as_path()));
        fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_worker_applies_reloads_in_order() {
        let path = temp_path("ordered.csv");
        fs::write(&path, format!("{}{}", HEADER, row("Kobe Bryant"))).unwrap();

        let registry = Arc::new(RegistryHandle::new(Registry::empty()));
        let (tx, rx) = reload_channel();
        let worker = tokio::spawn(run_reload_worker(registry.clone(), path.clone(), rx));

        tx.send(()).await.unwrap();
        fs::write(
            &path,
            format!("{}{}{}", HEADER, row("Kobe Bryant"), row("Stephen Curry")),
        )
        .unwrap();
        tx.send(()).await.unwrap();
        drop(tx);
        worker.await.unwrap();

        // Last request reflects the latest file contents
        assert_eq!(registry.snapshot().len(), 2);
        fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_worker_keeps_snapshot_on_failed_reload() {
        let path = temp_path("broken.csv");
        fs::write(&path, "name\nbroken\n").unwrap();

        let registry = Arc::new(RegistryHandle::new(Registry::empty()));
        let (tx, rx) = reload_channel();
        let worker = tokio::spawn(run_reload_worker(registry.clone(), path.clone(), rx));

        tx.send(()).await.unwrap();
        drop(tx);
        worker.await.unwrap();

        assert!(registry.snapshot().is_empty());
        fs::remove_file(&path).ok();
    }
}
