//! Key-value storage for business configs and reservation partitions.
//!
//! [`JsonFileStore`] keeps the on-disk layout:
//!
//! ```text
//! <root>/config_negocios/<negocio>.json
//! <root>/reservas/<negocio>/<DDD>/<calendario>.json
//! ```
//!
//! Every `put` rewrites the whole document. There is no locking, so two
//! processes writing the same key can lose an update.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{BookingError, Result};
use crate::models::{BusinessConfig, Reservation};

const CONFIG_DIR: &str = "config_negocios";
const RESERVATIONS_DIR: &str = "reservas";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Config {
        negocio: String,
    },
    Reservations {
        negocio: String,
        dia_del_anio: String,
        calendario: u32,
    },
}

impl StoreKey {
    pub fn config(negocio: &str) -> Result<Self> {
        validate_business_id(negocio)?;
        Ok(Self::Config {
            negocio: negocio.to_string(),
        })
    }

    pub fn reservations(negocio: &str, dia_del_anio: &str, calendario: u32) -> Result<Self> {
        validate_business_id(negocio)?;
        Ok(Self::Reservations {
            negocio: negocio.to_string(),
            dia_del_anio: dia_del_anio.to_string(),
            calendario,
        })
    }

    /// Path of this key relative to the store root.
    pub fn relative_path(&self) -> PathBuf {
        match self {
            Self::Config { negocio } => Path::new(CONFIG_DIR).join(format!("{negocio}.json")),
            Self::Reservations {
                negocio,
                dia_del_anio,
                calendario,
            } => Path::new(RESERVATIONS_DIR)
                .join(negocio)
                .join(dia_del_anio)
                .join(format!("{calendario}.json")),
        }
    }
}

/// Business ids become path components, so they must not escape the root.
fn validate_business_id(negocio: &str) -> Result<()> {
    let bad = negocio.is_empty()
        || negocio == "."
        || negocio.contains("..")
        || negocio.contains(['/', '\\', '\0']);
    if bad {
        return Err(BookingError::InvalidBusinessId(negocio.to_string()));
    }
    Ok(())
}

/// Raw document storage. `get` returns `None` for keys never written.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &StoreKey, value: &[u8]) -> Result<()>;

    /// Where a key lives, for error messages.
    fn locate(&self, key: &StoreKey) -> PathBuf {
        key.relative_path()
    }
}

pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>> {
        let path = self.locate(key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(BookingError::Storage { path, source }),
        }
    }

    fn put(&self, key: &StoreKey, value: &[u8]) -> Result<()> {
        let path = self.locate(key);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| BookingError::Storage {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&path, value).map_err(|source| BookingError::Storage {
            path: path.clone(),
            source,
        })?;
        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn locate(&self, key: &StoreKey) -> PathBuf {
        self.root.join(key.relative_path())
    }
}

fn decode<T: DeserializeOwned>(store: &dyn KvStore, key: &StoreKey) -> Result<Option<T>> {
    match store.get(key)? {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| BookingError::Corrupt {
                path: store.locate(key),
                source,
            }),
        None => Ok(None),
    }
}

/// Pretty JSON with a four-space indent.
fn encode<T: Serialize>(store: &dyn KvStore, key: &StoreKey, value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
    value
        .serialize(&mut ser)
        .map_err(|source| BookingError::Corrupt {
            path: store.locate(key),
            source,
        })?;
    Ok(buf)
}

#[derive(Clone)]
pub struct ConfigStore {
    kv: Arc<dyn KvStore>,
}

impl ConfigStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// A business with no stored document gets the default (empty) config.
    pub fn load(&self, negocio: &str) -> Result<BusinessConfig> {
        let key = StoreKey::config(negocio)?;
        Ok(decode(self.kv.as_ref(), &key)?.unwrap_or_default())
    }

    pub fn save(&self, negocio: &str, config: &BusinessConfig) -> Result<()> {
        let key = StoreKey::config(negocio)?;
        let bytes = encode(self.kv.as_ref(), &key, config)?;
        self.kv.put(&key, &bytes)
    }
}

#[derive(Clone)]
pub struct ReservationStore {
    kv: Arc<dyn KvStore>,
}

impl ReservationStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub fn load(&self, negocio: &str, dia_del_anio: &str, calendario: u32) -> Result<Vec<Reservation>> {
        let key = StoreKey::reservations(negocio, dia_del_anio, calendario)?;
        Ok(decode(self.kv.as_ref(), &key)?.unwrap_or_default())
    }

    pub fn save(
        &self,
        negocio: &str,
        dia_del_anio: &str,
        calendario: u32,
        reservas: &[Reservation],
    ) -> Result<()> {
        let key = StoreKey::reservations(negocio, dia_del_anio, calendario)?;
        let bytes = encode(self.kv.as_ref(), &key, &reservas)?;
        self.kv.put(&key, &bytes)
    }
}
