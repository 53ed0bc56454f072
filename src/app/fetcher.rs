//! Folder fetching
//!
//! `FolderFetcher` is the seam call sites depend on: given a folder
//! identifier it materializes the folder on disk and returns the local file
//! paths. `DriveFetcher` implements it against Google Drive.

use std::path::{is_separator, Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::app::client::{ClientConfig, DriveClient};
use crate::app::models::{sanitize_name, Dataset, DriveFolder, FolderId};
use crate::app::progress::FetchProgress;
use crate::errors::Result;

/// Options for a single folder fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Suppress status lines and progress bars
    pub quiet: bool,
    /// Seed the session with the persisted browser cookies
    pub use_cookies: bool,
    /// Destination root; `None` places the folder under the working directory
    pub output: Option<PathBuf>,
    /// Accept folders whose listing stops at the page limit
    pub remaining_ok: bool,
    /// Resolve paths without writing anything
    pub dry_run: bool,
}

/// Download every file of a remote folder to local disk
#[async_trait]
pub trait FolderFetcher: Send + Sync {
    /// Fetch `folder` (URL or bare ID), returning the local file paths in
    /// listing order
    async fn fetch(&self, folder: &str, options: &FetchOptions) -> Result<Vec<PathBuf>>;
}

/// Fetcher backed by Drive's public folder pages
#[derive(Debug, Clone, Default)]
pub struct DriveFetcher {
    config: ClientConfig,
}

impl DriveFetcher {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolve the remote tree of `folder` without downloading
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the identifier is invalid or the listing fails
    pub async fn list(&self, folder: &str, options: &FetchOptions) -> Result<DriveFolder> {
        let folder_id = FolderId::parse(folder)?;
        let client = DriveClient::new(&self.config, options.use_cookies)?;
        let progress = FetchProgress::new(options.quiet);

        progress.status("Retrieving folder contents");
        Ok(client
            .list_folder(&folder_id, options.remaining_ok, &progress)
            .await?)
    }

    async fn download_tree(
        &self,
        client: &DriveClient,
        tree: &DriveFolder,
        root: &Path,
        progress: &FetchProgress,
    ) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(root).await?;

        let mut files = Vec::with_capacity(tree.file_count());
        for entry in tree.plan() {
            let path = root.join(&entry.relative_path);
            let Some(file_id) = entry.file_id else {
                tokio::fs::create_dir_all(&path).await?;
                continue;
            };

            let name = entry.relative_path.display().to_string();
            let file_progress = progress.start_file(&name, None)?;
            let bytes = client.download_file(&file_id, &path, file_progress).await?;
            debug!("Wrote {} bytes to {}", bytes, path.display());
            files.push(path);
        }

        Ok(files)
    }
}

#[async_trait]
impl FolderFetcher for DriveFetcher {
    async fn fetch(&self, folder: &str, options: &FetchOptions) -> Result<Vec<PathBuf>> {
        let folder_id = FolderId::parse(folder)?;
        let client = DriveClient::new(&self.config, options.use_cookies)?;
        let progress = FetchProgress::new(options.quiet);

        progress.status("Retrieving folder contents");
        let tree = client
            .list_folder(&folder_id, options.remaining_ok, &progress)
            .await?;
        progress.status("Retrieving folder contents completed");

        let root = resolve_root(options.output.as_deref(), &tree.name)?;
        info!(
            "Fetching {} files of folder {} ({}) into {}",
            tree.file_count(),
            tree.name,
            folder_id,
            root.display()
        );

        if options.dry_run {
            return Ok(tree
                .plan()
                .into_iter()
                .filter(|entry| !entry.is_directory())
                .map(|entry| root.join(entry.relative_path))
                .collect());
        }

        progress.status("Building directory structure");
        let files = match self.download_tree(&client, &tree, &root, &progress).await {
            Ok(files) => files,
            Err(e) => {
                warn!("Folder {} is incomplete in {}: {}", folder_id, root.display(), e);
                return Err(e);
            }
        };
        progress.status("Download completed");

        Ok(files)
    }
}

/// Local root directory for a folder named `folder_name`
///
/// `None` gives `<cwd>/<folder_name>`, a path ending in a separator gives
/// `<path>/<folder_name>`, any other path is used as is.
///
/// # Errors
///
/// Returns `AppError::Io` if the working directory cannot be determined
pub fn resolve_root(output: Option<&Path>, folder_name: &str) -> Result<PathBuf> {
    let name = sanitize_name(folder_name);
    match output {
        None => Ok(std::env::current_dir()?.join(name)),
        Some(path) => {
            let ends_with_separator = path
                .as_os_str()
                .to_string_lossy()
                .chars()
                .last()
                .map_or(false, is_separator);
            if ends_with_separator {
                Ok(path.join(name))
            } else {
                Ok(path.to_path_buf())
            }
        }
    }
}

/// Fetch each dataset in order, stopping at the first failure
///
/// # Errors
///
/// Returns the first dataset's error; later datasets are not attempted
pub async fn fetch_datasets(
    fetcher: &dyn FolderFetcher,
    datasets: &[Dataset],
    options: &FetchOptions,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for dataset in datasets {
        info!("Fetching dataset {} from {}", dataset.name, dataset.folder);
        let fetched = fetcher.fetch(&dataset.folder, options).await?;
        info!("Dataset {}: {} files", dataset.name, fetched.len());
        files.extend(fetched);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::listing::tests::folder_page;
    use crate::constants::drive;
    use crate::app::client::download::temp_path_for;
    use crate::errors::{AppError, DownloadError, FolderError};
    use httpmock::prelude::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const ROOT_ID: &str = "1rootfolder000";
    const SUB_ID: &str = "1subfolder0000";

    /// Records calls and fails for one folder
    struct RecordingFetcher {
        calls: Mutex<Vec<String>>,
        failing: Option<&'static str>,
    }

    impl RecordingFetcher {
        fn new(failing: Option<&'static str>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                failing,
            }
        }
    }

    #[async_trait]
    impl FolderFetcher for RecordingFetcher {
        async fn fetch(&self, folder: &str, _options: &FetchOptions) -> Result<Vec<PathBuf>> {
            self.calls.lock().unwrap().push(folder.to_string());
            if self.failing == Some(folder) {
                return Err(AppError::Folder(FolderError::NotFound {
                    folder_id: folder.to_string(),
                }));
            }
            Ok(vec![PathBuf::from(folder).join("data.csv")])
        }
    }

    fn options_into(dir: &Path) -> FetchOptions {
        FetchOptions {
            quiet: true,
            output: Some(dir.to_path_buf()),
            ..Default::default()
        }
    }

    fn fetcher_for(server: &MockServer) -> DriveFetcher {
        DriveFetcher::new(ClientConfig {
            base_url: server.base_url(),
            ..Default::default()
        })
    }

    async fn mock_file(server: &MockServer, id: &str, name: &str, body: &str) {
        let disposition = format!("attachment; filename=\"{}\"", name);
        let body = body.to_string();
        server
            .mock_async(move |when, then| {
                when.method(GET).path("/uc").query_param("id", id);
                then.status(200)
                    .header("content-type", "text/csv")
                    .header("content-disposition", disposition.as_str())
                    .body(body.as_str());
            })
            .await;
    }

    #[tokio::test]
    async fn test_fetch_datasets_in_order() {
        let fetcher = RecordingFetcher::new(None);
        let datasets = vec![Dataset::new("commodities", "c"), Dataset::new("macro", "m")];

        let files = fetch_datasets(&fetcher, &datasets, &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(*fetcher.calls.lock().unwrap(), vec!["c", "m"]);
    }

    #[tokio::test]
    async fn test_fetch_datasets_stops_at_first_failure() {
        let fetcher = RecordingFetcher::new(Some("c"));
        let datasets = vec![Dataset::new("commodities", "c"), Dataset::new("macro", "m")];

        let result = fetch_datasets(&fetcher, &datasets, &FetchOptions::default()).await;

        assert!(matches!(result, Err(AppError::Folder(FolderError::NotFound { .. }))));
        assert_eq!(*fetcher.calls.lock().unwrap(), vec!["c"]);
    }

    #[test]
    fn test_resolve_root() {
        assert_eq!(
            resolve_root(Some(Path::new("/data/out")), "commodities").unwrap(),
            PathBuf::from("/data/out")
        );
        assert_eq!(
            resolve_root(Some(Path::new("/data/out/")), "commodities").unwrap(),
            PathBuf::from("/data/out/commodities")
        );
        assert_eq!(
            resolve_root(None, "macro").unwrap(),
            std::env::current_dir().unwrap().join("macro")
        );
        assert_eq!(
            resolve_root(Some(Path::new("/data/")), "a/b").unwrap(),
            PathBuf::from("/data/a_b")
        );
    }

    #[tokio::test]
    async fn test_fetch_writes_folder_tree() {
        let server = MockServer::start_async().await;
        let temp_dir = TempDir::new().unwrap();

        let root_page = folder_page(
            "commodities",
            &[
                ("1fileA000000", "A.csv", "text/csv"),
                ("1fileB000000", "B.csv", "text/csv"),
                (SUB_ID, "energy", drive::FOLDER_MIME_TYPE),
            ],
        );
        let sub_page = folder_page("energy", &[("1fileC000000", "C.csv", "text/csv")]);

        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(format!("/drive/folders/{}", ROOT_ID))
                    .query_param("hl", "en");
                then.status(200).body(root_page.as_str());
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/drive/folders/{}", SUB_ID));
                then.status(200).body(sub_page.as_str());
            })
            .await;
        mock_file(&server, "1fileA000000", "A.csv", "date,price\n2024-01-02,71.3\n").await;
        mock_file(&server, "1fileB000000", "B.csv", "date,price\n2024-01-02,2.41\n").await;
        mock_file(&server, "1fileC000000", "C.csv", "x\n").await;

        let fetcher = fetcher_for(&server);
        let files = fetcher
            .fetch(ROOT_ID, &options_into(temp_dir.path()))
            .await
            .unwrap();

        assert_eq!(
            files,
            vec![
                temp_dir.path().join("A.csv"),
                temp_dir.path().join("B.csv"),
                temp_dir.path().join("energy").join("C.csv"),
            ]
        );
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("A.csv")).unwrap(),
            "date,price\n2024-01-02,71.3\n"
        );
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("energy/C.csv")).unwrap(),
            "x\n"
        );
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let server = MockServer::start_async().await;
        let temp_dir = TempDir::new().unwrap();
        let page = folder_page("macro", &[("1fileA000000", "A.csv", "text/csv")]);

        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/drive/folders/{}", ROOT_ID));
                then.status(200).body(page.as_str());
            })
            .await;
        let download = server
            .mock_async(|when, then| {
                when.method(GET).path("/uc");
                then.status(200).body("unused");
            })
            .await;

        let output = temp_dir.path().join("out/");
        let options = FetchOptions {
            dry_run: true,
            ..options_into(&output)
        };
        let files = fetcher_for(&server).fetch(ROOT_ID, &options).await.unwrap();

        assert_eq!(files, vec![output.join("macro").join("A.csv")]);
        assert!(!output.exists());
        download.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_missing_folder_writes_nothing() {
        let server = MockServer::start_async().await;
        let temp_dir = TempDir::new().unwrap();
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/drive/folders/{}", ROOT_ID));
                then.status(404);
            })
            .await;

        let output = temp_dir.path().join("out");
        let result = fetcher_for(&server)
            .fetch(ROOT_ID, &options_into(&output))
            .await;

        assert!(matches!(result, Err(AppError::Folder(FolderError::NotFound { .. }))));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_invalid_identifier_makes_no_request() {
        let server = MockServer::start_async().await;
        let any = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200);
            })
            .await;

        let result = fetcher_for(&server)
            .fetch("https://example.com/nope", &FetchOptions::default())
            .await;

        assert!(matches!(
            result,
            Err(AppError::Folder(FolderError::InvalidIdentifier { .. }))
        ));
        any.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_failed_file_keeps_earlier_files() {
        let server = MockServer::start_async().await;
        let temp_dir = TempDir::new().unwrap();
        let page = folder_page(
            "macro",
            &[
                ("1fileA000000", "A.csv", "text/csv"),
                ("1fileB000000", "B.csv", "text/csv"),
            ],
        );

        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/drive/folders/{}", ROOT_ID));
                then.status(200).body(page.as_str());
            })
            .await;
        mock_file(&server, "1fileA000000", "A.csv", "date,cpi\n2024-01,3.1\n").await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/uc").query_param("id", "1fileB000000");
                then.status(404);
            })
            .await;

        let result = fetcher_for(&server)
            .fetch(ROOT_ID, &options_into(temp_dir.path()))
            .await;

        assert!(matches!(
            result,
            Err(AppError::Download(DownloadError::NotFound { .. }))
        ));
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("A.csv")).unwrap(),
            "date,cpi\n2024-01,3.1\n"
        );
        let b = temp_dir.path().join("B.csv");
        assert!(!b.exists());
        assert!(!temp_path_for(&b).exists());
    }
}
