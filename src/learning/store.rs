//! Persistência do snapshot de aprendizado.
//!
//! - [`JsonFileStore`]: um arquivo JSON, gravado via arquivo temporário + rename
//! - [`MemoryStore`]: em memória, para testes e execuções efêmeras
//! - [`SqliteStore`]: SQLite, um registro por gravação (feature `sqlite`)

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::types::config::{LearningConfig, StoreKind};
use crate::{PadraoError, PadraoResult};

use super::insights::InsightsSnapshot;

/// Armazenamento do snapshot de aprendizado.
#[async_trait]
pub trait InsightsStore: Send + Sync {
    /// Descrição curta (tipo e local).
    fn describe(&self) -> String;

    /// Carrega o último snapshot, se houver.
    async fn load(&self) -> PadraoResult<Option<InsightsSnapshot>>;

    /// Grava o snapshot.
    async fn save(&self, snapshot: &InsightsSnapshot) -> PadraoResult<()>;

    /// Apaga todo o estado gravado.
    async fn clear(&self) -> PadraoResult<()>;
}

/// Abre o store configurado.
pub fn open_store(config: &LearningConfig) -> PadraoResult<Arc<dyn InsightsStore>> {
    match config.store {
        StoreKind::Json => Ok(Arc::new(JsonFileStore::new(&config.insights_path))),
        #[cfg(feature = "sqlite")]
        StoreKind::Sqlite => Ok(Arc::new(SqliteStore::open(&config.insights_path)?)),
        #[cfg(not(feature = "sqlite"))]
        StoreKind::Sqlite => Err(PadraoError::config(
            "store = \"sqlite\" requer a feature `sqlite`",
        )),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// JSON
// ═══════════════════════════════════════════════════════════════════════════

/// Snapshot em um arquivo JSON.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "insights".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl InsightsStore for JsonFileStore {
    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }

    async fn load(&self) -> PadraoResult<Option<InsightsSnapshot>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }
        let json = tokio::fs::read_to_string(&self.path).await?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    async fn save(&self, snapshot: &InsightsSnapshot) -> PadraoResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(snapshot)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), "Insights saved");
        Ok(())
    }

    async fn clear(&self) -> PadraoResult<()> {
        if tokio::fs::try_exists(&self.path).await? {
            tokio::fs::remove_file(&self.path).await?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Memória
// ═══════════════════════════════════════════════════════════════════════════

/// Snapshot em memória.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<InsightsSnapshot>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store já populado.
    pub fn with_snapshot(snapshot: InsightsSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Número de gravações feitas.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InsightsStore for MemoryStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn load(&self) -> PadraoResult<Option<InsightsSnapshot>> {
        Ok(self.snapshot.lock().await.clone())
    }

    async fn save(&self, snapshot: &InsightsSnapshot) -> PadraoResult<()> {
        *self.snapshot.lock().await = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self) -> PadraoResult<()> {
        *self.snapshot.lock().await = None;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SQLite
// ═══════════════════════════════════════════════════════════════════════════

/// Snapshots em SQLite. O registro mais recente vence.
#[cfg(feature = "sqlite")]
pub struct SqliteStore {
    path: PathBuf,
    // Mutex porque rusqlite::Connection não é Sync
    conn: Mutex<rusqlite::Connection>,
}

#[cfg(feature = "sqlite")]
impl SqliteStore {
    /// Cria ou abre o banco.
    pub fn open(path: impl AsRef<Path>) -> PadraoResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = rusqlite::Connection::open(&path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                saved_at TEXT NOT NULL,
                data TEXT NOT NULL
            );
        "#,
        )?;

        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Número de snapshots gravados.
    pub async fn count(&self) -> PadraoResult<usize> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(feature = "sqlite")]
#[async_trait]
impl InsightsStore for SqliteStore {
    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }

    async fn load(&self) -> PadraoResult<Option<InsightsSnapshot>> {
        use rusqlite::OptionalExtension;

        let conn = self.conn.lock().await;
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM snapshots ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, snapshot: &InsightsSnapshot) -> PadraoResult<()> {
        let json = serde_json::to_string(snapshot)?;
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO snapshots (saved_at, data) VALUES (?, ?)",
            rusqlite::params![chrono::Utc::now().to_rfc3339(), json],
        )?;
        Ok(())
    }

    async fn clear(&self) -> PadraoResult<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM snapshots", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_snapshot() -> InsightsSnapshot {
        let mut snapshot = InsightsSnapshot::default();
        snapshot.training_projects.insert("proj".to_string());
        snapshot.add_variations("getter", vec!["get_[a-zA-Z]+".to_string()]);
        snapshot
    }

    #[tokio::test]
    async fn test_json_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/insights.json"));

        assert!(store.load().await.unwrap().is_none());

        store.save(&create_test_snapshot()).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();

        assert!(loaded.is_trained("proj"));
        assert!(!store.temp_path().exists());

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_json_store_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("insights.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load().await, Err(PadraoError::Json(_))));
    }

    #[tokio::test]
    async fn test_memory_store_counts_saves() {
        let store = MemoryStore::new();
        store.save(&create_test_snapshot()).await.unwrap();
        store.save(&create_test_snapshot()).await.unwrap();

        assert_eq!(store.save_count(), 2);
        assert!(store.load().await.unwrap().is_some());
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_sqlite_store_latest_wins() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path().join("insights.db")).unwrap();

        assert!(store.load().await.unwrap().is_none());

        let mut snapshot = create_test_snapshot();
        store.save(&snapshot).await.unwrap();
        snapshot.training_projects.insert("second".to_string());
        store.save(&snapshot).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert!(loaded.is_trained("second"));
        assert_eq!(store.count().await.unwrap(), 2);

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[test]
    fn test_open_store_from_config() {
        let dir = TempDir::new().unwrap();
        let config = LearningConfig {
            insights_path: dir.path().join("i.json"),
            ..LearningConfig::default()
        };

        let store = open_store(&config).unwrap();
        assert!(store.describe().starts_with("json:"));
    }
}
