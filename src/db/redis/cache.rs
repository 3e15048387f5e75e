use redis::{aio::ConnectionManager, AsyncCommands, Client};
use std::{fmt::Display, time::Duration};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::error::AppResult;
use crate::models::MovieId;

/// Pending writes beyond this are dropped rather than queued
const WRITE_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Poster(MovieId),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Poster(id) => write!(f, "poster:{}", id),
        }
    }
}

/// Opens a Redis client; no connection is made until [`Cache::connect`]
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

struct PendingWrite {
    key: CacheKey,
    value: String,
}

/// Poster URL cache backed by Redis
///
/// Reads go straight to Redis. Writes are handed to a background task so a
/// lookup never waits on them.
#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
    writes: mpsc::Sender<PendingWrite>,
}

/// Stops the background writer once queued writes are flushed
pub struct CacheWriterHandle {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Cache writer task ended abnormally");
        }
    }
}

impl Cache {
    /// Connects and starts the writer task
    pub async fn connect(client: Client, ttl: Duration) -> AppResult<(Self, CacheWriterHandle)> {
        let conn = ConnectionManager::new(client).await?;
        let (writes, write_rx) = mpsc::channel(WRITE_QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(Self::run_writer(conn.clone(), ttl, write_rx, shutdown_rx));

        Ok((
            Self { conn, writes },
            CacheWriterHandle { shutdown_tx, task },
        ))
    }

    async fn run_writer(
        mut conn: ConnectionManager,
        ttl: Duration,
        mut write_rx: mpsc::Receiver<PendingWrite>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        tracing::debug!("Cache writer started");

        loop {
            tokio::select! {
                write = write_rx.recv() => match write {
                    Some(write) => Self::store(&mut conn, ttl, write).await,
                    None => break,
                },
                _ = &mut shutdown_rx => {
                    write_rx.close();
                    let mut flushed = 0usize;
                    while let Some(write) = write_rx.recv().await {
                        Self::store(&mut conn, ttl, write).await;
                        flushed += 1;
                    }
                    tracing::info!(flushed, "Cache writer stopped");
                    return;
                }
            }
        }

        tracing::debug!("Cache writer stopped, all caches dropped");
    }

    async fn store(conn: &mut ConnectionManager, ttl: Duration, write: PendingWrite) {
        let result: redis::RedisResult<()> = conn
            .set_ex(write.key.to_string(), write.value, ttl.as_secs().max(1))
            .await;
        if let Err(e) = result {
            tracing::warn!(key = %write.key, error = %e, "Cache write failed");
        }
    }

    /// Cached poster URL for `id`, `None` on a miss
    pub async fn poster(&self, id: MovieId) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let url: Option<String> = conn.get(CacheKey::Poster(id).to_string()).await?;
        Ok(url)
    }

    /// Queues `url` as the poster for `id`
    pub fn store_poster(&self, id: MovieId, url: &str) {
        let write = PendingWrite {
            key: CacheKey::Poster(id),
            value: url.to_string(),
        };

        if let Err(e) = self.writes.try_send(write) {
            tracing::warn!(movie_id = %id, error = %e, "Cache write dropped");
        }
    }
}
