use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::{error, info};
use rusqlite::{params, Connection};
use tokio::sync::oneshot;
use uuid::Uuid;

mod migrations;

use crate::ingest::RawSample;
use crate::profile::FocusProfile;
use migrations::run_migrations;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct StoreInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to store thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join store thread: {join_err:?}");
            }
        }
    }
}

/// SQLite-backed store behind a dedicated worker thread. All connection use
/// happens on that thread; callers hand in closures and await the reply.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
    db_path: Arc<PathBuf>,
}

impl Store {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("focusgraph-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run database migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("Store initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Store thread shutting down");
            })
            .with_context(|| "failed to spawn store worker thread")?;

        ready_rx
            .recv()
            .context("store worker exited before signaling readiness")??;

        info!("Store initialized at {}", db_path.as_path().display());

        Ok(Self {
            inner: Arc::new(StoreInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("Store caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to store thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("store thread terminated unexpectedly"))?
    }

    /// Persist the single device profile. The device id survives profile
    /// rewrites; the first save mints one.
    pub async fn save_profile(&self, profile: &FocusProfile) -> Result<String> {
        let profile_json =
            serde_json::to_string(profile).context("failed to serialize profile")?;

        self.execute(move |conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT device_id FROM device_profile WHERE id = 1",
                    [],
                    |row| row.get(0),
                )
                .map(Some)
                .or_else(|err| match err {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })
                .context("failed to read existing device id")?;

            let device_id = existing.unwrap_or_else(|| Uuid::new_v4().to_string());

            conn.execute(
                "INSERT INTO device_profile (id, device_id, profile_json, updated_at)
                 VALUES (1, ?1, ?2, ?3)
                 ON CONFLICT (id) DO UPDATE SET
                     profile_json = excluded.profile_json,
                     updated_at = excluded.updated_at",
                params![device_id, profile_json, Utc::now().to_rfc3339()],
            )
            .with_context(|| "failed to save profile")?;

            Ok(device_id)
        })
        .await
    }

    /// Load the stored profile, None before onboarding has run.
    pub async fn load_profile(&self) -> Result<Option<FocusProfile>> {
        self.execute(|conn| {
            let row: Option<String> = conn
                .query_row(
                    "SELECT profile_json FROM device_profile WHERE id = 1",
                    [],
                    |row| row.get(0),
                )
                .map(Some)
                .or_else(|err| match err {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })
                .context("failed to load profile")?;

            row.map(|json| {
                serde_json::from_str(&json).context("failed to deserialize stored profile")
            })
            .transpose()
        })
        .await
    }

    pub async fn insert_samples(&self, samples: Vec<RawSample>) -> Result<()> {
        self.execute(move |conn| {
            let tx = conn
                .transaction()
                .context("failed to open sample insert transaction")?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO raw_samples
                         (timestamp, keystrokes, clicks, scrolls, switches, dominant_app, category)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )?;
                for sample in &samples {
                    stmt.execute(params![
                        sample.timestamp,
                        sample.keystrokes,
                        sample.clicks,
                        sample.scrolls,
                        sample.switches,
                        sample.dominant_app,
                        sample.category,
                    ])
                    .with_context(|| "failed to insert raw sample")?;
                }
            }
            tx.commit().context("failed to commit sample inserts")?;
            Ok(())
        })
        .await
    }

    /// Samples with `start <= timestamp < end`, ascending by timestamp.
    pub async fn samples_in_range(&self, start: i64, end: i64) -> Result<Vec<RawSample>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT timestamp, keystrokes, clicks, scrolls, switches, dominant_app, category
                 FROM raw_samples
                 WHERE timestamp >= ?1 AND timestamp < ?2
                 ORDER BY timestamp ASC, id ASC",
            )?;

            let mut rows = stmt.query(params![start, end])?;
            let mut samples = Vec::new();
            while let Some(row) = rows.next()? {
                samples.push(RawSample {
                    timestamp: row.get(0)?,
                    keystrokes: row.get(1)?,
                    clicks: row.get(2)?,
                    scrolls: row.get(3)?,
                    switches: row.get(4)?,
                    dominant_app: row.get(5)?,
                    category: row.get(6)?,
                });
            }

            Ok(samples)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("focusgraph.db")).unwrap();
        (dir, store)
    }

    fn sample(ts: i64, keystrokes: u32) -> RawSample {
        RawSample {
            timestamp: ts,
            keystrokes,
            clicks: 0,
            scrolls: 0,
            switches: 0,
            dominant_app: Some("Code".to_string()),
            category: None,
        }
    }

    #[tokio::test]
    async fn profile_round_trips_and_keeps_device_id() {
        let (_dir, store) = temp_store();

        assert!(store.load_profile().await.unwrap().is_none());

        let profile = FocusProfile::default();
        let first_id = store.save_profile(&profile).await.unwrap();

        let mut updated = profile.clone();
        updated.priority_category = "browser".to_string();
        updated.recompute_derived();
        let second_id = store.save_profile(&updated).await.unwrap();
        assert_eq!(first_id, second_id);

        let loaded = store.load_profile().await.unwrap().unwrap();
        assert_eq!(loaded, updated);
    }

    #[tokio::test]
    async fn samples_query_is_half_open_and_ordered() {
        let (_dir, store) = temp_store();

        store
            .insert_samples(vec![sample(100, 1), sample(110, 2), sample(105, 3)])
            .await
            .unwrap();

        let rows = store.samples_in_range(100, 110).await.unwrap();
        let timestamps: Vec<i64> = rows.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![100, 105]);
    }

    #[tokio::test]
    async fn reopening_the_store_preserves_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("focusgraph.db");

        {
            let store = Store::new(path.clone()).unwrap();
            store.insert_samples(vec![sample(1, 5)]).await.unwrap();
        }

        let store = Store::new(path).unwrap();
        let rows = store.samples_in_range(0, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].keystrokes, 5);
    }
}
