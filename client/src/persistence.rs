//! Cart persistence.
//!
//! The cart survives restarts as a JSON snapshot. Restoring goes through
//! [`CartAction::ReplaceAll`] like any other mutation, and snapshots are
//! validated before they reach the store.

use crate::app::{AppAction, AppStore};
use crate::cart::{CartAction, CartInconsistency, CartState};
use chrono::{DateTime, Utc};
use hawker_core::environment::Clock;
use hawker_runtime::StoreError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Snapshot format version written by this crate
pub const FORMAT_VERSION: u32 = 1;

/// Errors from loading or saving the cart
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Reading or writing the backing file failed
    #[error("cart storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot is not valid JSON for a cart
    #[error("malformed cart snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot was written by an incompatible version
    #[error("unsupported cart snapshot version {0}")]
    UnsupportedVersion(u32),

    /// The snapshot decodes but breaks a cart invariant
    #[error("inconsistent cart snapshot: {0}")]
    Inconsistent(#[from] CartInconsistency),

    /// The store refused the restored cart
    #[error("store rejected restored cart: {0}")]
    Store(#[from] StoreError),
}

/// Boxed future returned by [`CartStorage`]
pub type StorageFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, PersistenceError>> + Send + 'a>>;

/// Load/save of the serialized cart
pub trait CartStorage: Send + Sync {
    /// Load the saved cart, or `None` if nothing was saved
    fn load(&self) -> StorageFuture<'_, Option<CartState>>;

    /// Save a cart snapshot, replacing any previous one
    fn save<'a>(&'a self, cart: &'a CartState) -> StorageFuture<'a, ()>;
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    cart: &'a CartState,
}

#[derive(Deserialize)]
struct SnapshotHeader {
    version: u32,
}

#[derive(Deserialize)]
struct Snapshot {
    cart: CartState,
}

/// Cart storage in a JSON file
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-write leaves the previous snapshot intact. Every
/// save gets its own temporary file; overlapping saves never share one.
#[derive(Clone)]
pub struct JsonFileCartStorage {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    saves: Arc<AtomicU64>,
}

impl JsonFileCartStorage {
    /// Creates storage at `path`, stamping snapshots with `clock`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
            saves: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Location of the snapshot
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let save = self.saves.fetch_add(1, Ordering::Relaxed);
        let mut name = std::ffi::OsString::from(".");
        name.push(self.path.file_name().unwrap_or_default());
        name.push(format!(".{}.{save}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }

    async fn write_atomically(&self, temp: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = tokio::fs::File::create(temp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(temp, &self.path).await
    }

    fn decode(bytes: &[u8]) -> Result<CartState, PersistenceError> {
        let header: SnapshotHeader = serde_json::from_slice(bytes)?;
        if header.version != FORMAT_VERSION {
            return Err(PersistenceError::UnsupportedVersion(header.version));
        }

        let snapshot: Snapshot = serde_json::from_slice(bytes)?;
        snapshot.cart.validate()?;
        Ok(snapshot.cart)
    }
}

impl std::fmt::Debug for JsonFileCartStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileCartStorage")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl CartStorage for JsonFileCartStorage {
    fn load(&self) -> StorageFuture<'_, Option<CartState>> {
        Box::pin(async move {
            let bytes = match tokio::fs::read(&self.path).await {
                Ok(bytes) => bytes,
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(path = %self.path.display(), "No saved cart");
                    return Ok(None);
                },
                Err(error) => return Err(error.into()),
            };

            let cart = Self::decode(&bytes)?;
            tracing::debug!(
                path = %self.path.display(),
                items = cart.items().len(),
                "Loaded saved cart"
            );
            Ok(Some(cart))
        })
    }

    fn save<'a>(&'a self, cart: &'a CartState) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            let snapshot = SnapshotRef {
                version: FORMAT_VERSION,
                saved_at: self.clock.now(),
                cart,
            };
            let bytes = serde_json::to_vec_pretty(&snapshot)?;

            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }

            let temp = self.temp_path();
            if let Err(error) = self.write_atomically(&temp, &bytes).await {
                let _ = tokio::fs::remove_file(&temp).await;
                return Err(error.into());
            }

            tracing::trace!(path = %self.path.display(), "Saved cart");
            Ok(())
        })
    }
}

/// Loads the saved cart into the store
///
/// Returns `true` if a cart was restored. A missing snapshot leaves the
/// store untouched.
///
/// # Errors
///
/// Returns [`PersistenceError`] if the snapshot cannot be read or validated,
/// or the store is shutting down.
pub async fn restore_cart(
    store: &AppStore,
    storage: &dyn CartStorage,
) -> Result<bool, PersistenceError> {
    let Some(cart) = storage.load().await? else {
        return Ok(false);
    };

    store
        .send(AppAction::Cart(CartAction::ReplaceAll(cart)))
        .await?;
    Ok(true)
}

/// Saves the store's current cart
///
/// # Errors
///
/// Returns [`PersistenceError`] if the snapshot cannot be written.
pub async fn persist_cart(
    store: &AppStore,
    storage: &dyn CartStorage,
) -> Result<(), PersistenceError> {
    let cart = store.state(|state| state.cart.clone()).await;
    storage.save(&cart).await
}

/// Saves the cart after every applied cart action
///
/// The task runs until aborted. Save failures are logged and do not stop it.
#[must_use = "dropping the handle does not stop autosave; abort it to stop"]
pub fn spawn_autosave(store: AppStore, storage: Arc<dyn CartStorage>) -> JoinHandle<()> {
    let mut actions = store.subscribe_actions();

    tokio::spawn(async move {
        loop {
            match actions.recv().await {
                Ok(AppAction::Cart(_)) => {},
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Autosave lagged, saving latest cart");
                },
                Err(RecvError::Closed) => break,
            }

            if let Err(error) = persist_cart(&store, storage.as_ref()).await {
                tracing::warn!(error = %error, "Failed to save cart");
            }
        }
    })
}
