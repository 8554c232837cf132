//! The client control flow of a volunteer.
//!
//! A session starts from the local cache, reconciles it with the backing table
//! and then applies edits. Every edit is saved to the cache first and written
//! through to the backend second: a failed write-through leaves the edit in the
//! cache and is not retried.

use log::{info, warn};
use std::path::{Path, PathBuf};

use canvass_core::{codec, Edit, Resident, Roster};

use crate::canvass::auth::require_login;
use crate::canvass::cache::LocalCache;
use crate::canvass::client::BackendClient;
use crate::canvass::config_reader::CanvassConfig;
use crate::canvass::io_common::{make_id_prefix, read_residents};
use crate::canvass::store::WriteMode;
use crate::canvass::{export, *};

/// The result of an edit: the resident as now held locally, and what happened
/// when the change was sent to the backend.
#[derive(Debug)]
pub struct EditOutcome {
    pub resident: Resident,
    pub write_through: CanvassResult<WriteMode>,
}

pub struct Session {
    cache: LocalCache,
    client: BackendClient,
    roster: Roster,
}

impl Session {
    /// A session over the cached list. Nothing is fetched.
    pub fn new(cache: LocalCache, client: BackendClient) -> Session {
        let roster = Roster::new(cache.load());
        info!("Loaded {} residents from {:?}", roster.len(), cache.dir());
        Session {
            cache,
            client,
            roster,
        }
    }

    /// Opens a session for a logged-in volunteer.
    ///
    /// Unless `offline`, the backing table is fetched and merged into the cached
    /// list. A failed fetch is only logged.
    pub async fn open(config: &CanvassConfig, offline: bool) -> CanvassResult<Session> {
        let cache = LocalCache::new(config.cache_dir());
        require_login(&cache)?;
        let client = BackendClient::new(&config.backend_url())?;
        let mut session = Session::new(cache, client);
        if !offline {
            if let Err(e) = session.refresh().await {
                warn!("Error fetching residents, using the local list: {}", e);
            }
        }
        Ok(session)
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Fetches the backing table and reconciles it with the local list.
    ///
    /// On error the local list is left as it was.
    pub async fn refresh(&mut self) -> CanvassResult<usize> {
        let remote = self.client.fetch_residents().await?;
        info!("Fetched {} residents", remote.len());
        self.roster.merge_remote(remote);
        self.cache.save(self.roster.residents());
        Ok(self.roster.len())
    }

    /// Replaces the list with the content of an uploaded file, then overwrites
    /// the backing table with it.
    ///
    /// A file that cannot be read changes nothing. Once decoded, the new list is
    /// kept locally even when the upload to the backend fails.
    pub async fn import(&mut self, path: &str) -> CanvassResult<usize> {
        let mut residents = read_residents(path, &make_id_prefix())?;
        codec::renumber(&mut residents);
        info!("Imported {} residents from {:?}", residents.len(), path);
        self.roster.replace(residents);
        self.cache.save(self.roster.residents());
        self.client.sync_residents(self.roster.residents()).await
    }

    pub async fn edit(&mut self, id: &str, edit: Edit) -> CanvassResult<EditOutcome> {
        let resident = match self.roster.apply(id, &edit) {
            Some(r) => r.clone(),
            None => return UnknownResidentSnafu { id }.fail(),
        };
        self.cache.save(self.roster.residents());
        let write_through = self.client.update_resident(&resident).await;
        if let Err(e) = &write_through {
            warn!("Error saving resident {} to the backend: {}", id, e);
        }
        Ok(EditOutcome {
            resident,
            write_through,
        })
    }

    pub fn export(&self, dir: &Path, prefix: &str) -> CanvassResult<PathBuf> {
        export::export_residents(self.roster.residents(), dir, prefix)
    }

    /// Forgets the local list. The backing table is not touched.
    pub fn clear(&mut self) {
        self.roster.clear();
        self.cache.clear();
        info!("Cleared the local list");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvass::server::router;
    use crate::canvass::store::{MemoryBackend, StoreAdapter};
    use canvass_core::SerialNo;
    use std::sync::Arc;

    async fn spawn_backend(rows: Vec<Vec<String>>) -> (Arc<MemoryBackend>, BackendClient) {
        let backend = Arc::new(MemoryBackend::new(rows));
        let app = router(StoreAdapter::new(backend.clone(), "Sheet1"));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let client = BackendClient::new(&format!("http://{}", addr)).unwrap();
        (backend, client)
    }

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn table_row(serial: &str, name: &str, category: &str, visits: &str) -> Vec<String> {
        strings(&[serial, name, "", "", "", "", "", "", category, "", visits])
    }

    fn header() -> Vec<String> {
        strings(&codec::COLUMN_HEADERS)
    }

    fn write_csv(dir: &Path, contents: &str) -> String {
        let path = dir.join("upload.csv");
        std::fs::write(&path, contents).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn import_then_edit() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, client) = spawn_backend(vec![]).await;
        let mut session = Session::new(LocalCache::new(dir.path()), client);

        let path = write_csv(dir.path(), "S.No,Name,Visit Count\n7,Anna,1\n9,Bob,\n");
        assert_eq!(session.import(&path).await.unwrap(), 2);
        let serials: Vec<Option<SerialNo>> = session
            .roster()
            .residents()
            .iter()
            .map(|r| r.serial_no.clone())
            .collect();
        assert_eq!(serials, vec![Some(SerialNo::Number(1)), Some(SerialNo::Number(2))]);
        assert_eq!(backend.snapshot().len(), 3);

        let bob = session.roster().residents()[1].id.clone();
        let outcome = session.edit(&bob, Edit::Visit).await.unwrap();
        assert_eq!(outcome.resident.visit_count, 1);
        assert_eq!(outcome.write_through.unwrap(), WriteMode::Update);
        assert_eq!(backend.snapshot()[2][10], "1");

        // The cache holds the edit.
        let cached = LocalCache::new(dir.path()).load();
        assert_eq!(cached[1].visit_count, 1);
    }

    #[tokio::test]
    async fn unknown_id_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (_, client) = spawn_backend(vec![]).await;
        let mut session = Session::new(LocalCache::new(dir.path()), client);
        assert!(matches!(
            session.edit("nobody", Edit::Visit).await,
            Err(CanvassError::UnknownResident { .. })
        ));
    }

    #[tokio::test]
    async fn broken_upload_keeps_the_list() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        let existing = Resident {
            id: "keep".to_string(),
            serial_no: Some(SerialNo::Number(1)),
            name: "Kept".to_string(),
            ..Resident::default()
        };
        cache.save(&[existing.clone()]);
        let (backend, client) = spawn_backend(vec![]).await;
        let mut session = Session::new(cache, client);
        assert!(session.import("list.ods").await.is_err());
        assert_eq!(session.roster().residents(), &[existing]);
        assert!(backend.snapshot().is_empty());
    }

    #[tokio::test]
    async fn refresh_keeps_local_edits() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        cache.save(&[Resident {
            id: "old".to_string(),
            serial_no: Some(SerialNo::Number(1)),
            name: "Anna".to_string(),
            category: "FIRE".to_string(),
            visit_count: 2,
            ..Resident::default()
        }]);
        let (_, client) = spawn_backend(vec![
            header(),
            table_row("1", "Anna", "", "0"),
            table_row("2", "Bob", "SUN", "1"),
        ])
        .await;
        let mut session = Session::new(cache, client);
        assert_eq!(session.refresh().await.unwrap(), 2);
        let rs = session.roster().residents();
        assert_eq!(rs[0].category, "FIRE");
        assert_eq!(rs[0].visit_count, 2);
        assert_eq!(rs[1].category, "SUN");
        assert_eq!(LocalCache::new(dir.path()).load().len(), 2);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        cache.set_authenticated(true);
        cache.save(&[Resident {
            id: "a".to_string(),
            name: "Anna".to_string(),
            ..Resident::default()
        }]);
        let config = CanvassConfig {
            cache_dir: Some(dir.path().to_str().unwrap().to_string()),
            backend_url: Some("http://127.0.0.1:1".to_string()),
            ..CanvassConfig::default()
        };
        let session = Session::open(&config, false).await.unwrap();
        assert_eq!(session.roster().len(), 1);
    }

    #[tokio::test]
    async fn open_requires_login() {
        let dir = tempfile::tempdir().unwrap();
        let config = CanvassConfig {
            cache_dir: Some(dir.path().to_str().unwrap().to_string()),
            ..CanvassConfig::default()
        };
        assert!(matches!(
            Session::open(&config, true).await,
            Err(CanvassError::NotAuthenticated {})
        ));
    }

    #[tokio::test]
    async fn clear_leaves_the_table() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, client) = spawn_backend(vec![header(), table_row("1", "Anna", "", "0")]).await;
        let mut session = Session::new(LocalCache::new(dir.path()), client);
        session.refresh().await.unwrap();
        session.clear();
        assert!(session.roster().is_empty());
        assert!(LocalCache::new(dir.path()).load().is_empty());
        assert_eq!(backend.snapshot().len(), 2);
    }
}
