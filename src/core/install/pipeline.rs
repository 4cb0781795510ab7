use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use reqwest::Client;
use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};

use crate::core::catalog::ReleaseRecord;
use crate::core::downloader::{verify_sha1, FileFetcher, Progress, ProgressSink};
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::launcher::{icon_value, profile_name, register_profile, LauncherProfile};
use crate::core::loaders::{resolve_loader, LoaderInstaller, LoaderProfile};
use crate::core::mrpack::{extract_pack, Environment, FileEntry, PackManifest};
use crate::core::state::InstallerConfig;

// Share of overall progress for each stage.
const PACK_DOWNLOAD: (f32, f32) = (0.0, 0.2);
const EXTRACT: (f32, f32) = (0.2, 0.25);
const MODS: (f32, f32) = (0.25, 0.9);
const LOADER: (f32, f32) = (0.9, 0.95);

/// Where an install goes.
#[derive(Debug, Clone)]
pub struct InstallTarget {
    /// Game version picked by the user; the pack's own `minecraft`
    /// dependency takes precedence when present.
    pub game_version: String,
    pub launcher_root: PathBuf,
    pub game_dir: PathBuf,
}

/// A manifest file that could not be installed.
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of the mod-file stage.
#[derive(Debug, Clone, Default)]
pub struct ModInstallSummary {
    pub installed: usize,
    pub skipped: usize,
    pub failed: Vec<FileFailure>,
}

/// Outcome of a complete install.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub dependencies: BTreeMap<String, String>,
    pub loader: LoaderProfile,
    pub loader_already_installed: bool,
    pub overrides_written: usize,
    pub mods: ModInstallSummary,
    /// Name of the launcher profile, when registration succeeded.
    pub launcher_profile: Option<String>,
}

type OptionalPolicy = Box<dyn Fn(&FileEntry) -> bool + Send + Sync>;

/// Sequential install of a modpack release: pack download, extraction, mod
/// files, loader profile, launcher registration.
pub struct InstallPipeline<'c> {
    config: &'c InstallerConfig,
    fetcher: FileFetcher,
    loaders: LoaderInstaller,
    install_optional: OptionalPolicy,
}

impl<'c> InstallPipeline<'c> {
    pub fn new(config: &'c InstallerConfig, client: Client) -> Self {
        let include = config.install_optional;
        Self {
            config,
            fetcher: FileFetcher::new(client.clone()),
            loaders: LoaderInstaller::new(client),
            install_optional: Box::new(move |_| include),
        }
    }

    /// Decide per file whether an optional file gets installed.
    pub fn with_optional_policy<F>(mut self, policy: F) -> Self
    where
        F: Fn(&FileEntry) -> bool + Send + Sync + 'static,
    {
        self.install_optional = Box::new(policy);
        self
    }

    /// Install `record` into `target`.
    pub async fn install(
        &self,
        record: &ReleaseRecord,
        target: &InstallTarget,
        progress: &dyn ProgressSink,
    ) -> InstallerResult<InstallReport> {
        let file = record.primary_file()?;
        info!("Installing {} from {}", record.label(), file.url);

        progress.status("Downloading modpack", Progress::Fraction(PACK_DOWNLOAD.0));
        let (bytes, _) = self
            .fetcher
            .fetch_bytes(
                std::slice::from_ref(&file.url),
                file.size,
                &progress.subprogress(PACK_DOWNLOAD.0, PACK_DOWNLOAD.1),
            )
            .await?;

        if self.config.verify_checksums {
            if let Some(expected) = &file.hashes.sha1 {
                let actual = hex::encode(Sha1::digest(&bytes));
                if !actual.eq_ignore_ascii_case(expected) {
                    return Err(InstallerError::Checksum {
                        path: PathBuf::from(&file.url),
                        expected: expected.clone(),
                        actual,
                    });
                }
            }
        }

        self.install_archive(Cursor::new(bytes), target, progress).await
    }

    /// Install from an already available `.mrpack` file or buffer.
    pub async fn install_archive<R>(
        &self,
        reader: R,
        target: &InstallTarget,
        progress: &dyn ProgressSink,
    ) -> InstallerResult<InstallReport>
    where
        R: Read + Seek + Send + 'static,
    {
        progress.status("Extracting modpack", Progress::Fraction(EXTRACT.0));
        let side = self.config.side;
        let root = target.game_dir.clone();
        let extracted = tokio::task::spawn_blocking(move || extract_pack(reader, side, &root))
            .await
            .map_err(|e| InstallerError::Other(format!("Extraction task failed: {e}")))??;
        let manifest = extracted.manifest;

        let game_version = manifest
            .game_version()
            .unwrap_or(&target.game_version)
            .to_string();
        if game_version != target.game_version {
            warn!(
                "Pack targets Minecraft {} but {} was requested",
                game_version, target.game_version
            );
        }
        // Resolved up front so an unsupported pack fails before any download.
        let loader = resolve_loader(&manifest.dependencies, &game_version, &self.config.endpoints)?;

        progress.status("Downloading mods", Progress::Fraction(MODS.0));
        let mods = self
            .install_mods(
                &manifest,
                &target.game_dir,
                &progress.subprogress(MODS.0, MODS.1),
            )
            .await;

        progress.status("Installing mod loader", Progress::Fraction(LOADER.0));
        let staged = self.loaders.stage(&loader, &target.launcher_root).await?;

        progress.status("Registering launcher profile", Progress::Fraction(LOADER.1));
        let launcher_profile = match self.register(&loader, &game_version, target).await {
            Ok(name) => Some(name),
            Err(e) => {
                warn!("Launcher profile not registered: {}", e);
                None
            }
        };

        progress.status("Done", Progress::Fraction(1.0));
        info!(
            "Installed {} mod files ({} skipped, {} failed) into {:?}",
            mods.installed,
            mods.skipped,
            mods.failed.len(),
            target.game_dir
        );

        Ok(InstallReport {
            dependencies: manifest.dependencies,
            loader,
            loader_already_installed: staged.already_installed,
            overrides_written: extracted.overrides_written,
            mods,
            launcher_profile,
        })
    }

    /// Download every applicable manifest file into `game_dir`.
    ///
    /// Failures are logged and collected; they never abort the batch.
    pub async fn install_mods(
        &self,
        manifest: &PackManifest,
        game_dir: &Path,
        progress: &dyn ProgressSink,
    ) -> ModInstallSummary {
        let mut summary = ModInstallSummary::default();
        let total = manifest.files.len().max(1) as f32;

        for (i, file) in manifest.files.iter().enumerate() {
            let skip = match file.environment {
                Environment::Unsupported => true,
                Environment::Optional => !(self.install_optional)(file),
                Environment::Required => false,
            };
            if skip {
                debug!("Skipping {:?} ({:?})", file.relative_path, file.environment);
                summary.skipped += 1;
                progress.set((i + 1) as f32 / total);
                continue;
            }

            let sub = progress.subprogress(i as f32 / total, (i + 1) as f32 / total);
            match self.install_file(file, game_dir, &sub).await {
                Ok(()) => summary.installed += 1,
                Err(e) => {
                    warn!("Failed to download {:?}: {}", file.relative_path, e);
                    summary.failed.push(FileFailure {
                        path: file.relative_path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        summary
    }

    async fn install_file(
        &self,
        file: &FileEntry,
        game_dir: &Path,
        progress: &dyn ProgressSink,
    ) -> InstallerResult<()> {
        let dest = game_dir.join(&file.relative_path);
        self.fetcher
            .fetch_to_file(&file.mirror_urls, file.size_bytes, &dest, progress)
            .await?;

        if self.config.verify_checksums {
            if let Err(e) = verify_sha1(&dest, &file.sha1).await {
                let _ = tokio::fs::remove_file(&dest).await;
                return Err(e);
            }
        }
        Ok(())
    }

    async fn register(
        &self,
        loader: &LoaderProfile,
        game_version: &str,
        target: &InstallTarget,
    ) -> InstallerResult<String> {
        let name = profile_name(&self.config.display_name, game_version);
        let icon = icon_value(self.config.icon.as_deref()).await;
        let game_dir = std::path::absolute(&target.game_dir)
            .map_err(|e| InstallerError::io(&target.game_dir, e))?;
        let profile = LauncherProfile::new(&name, &loader.profile_id, &game_dir, icon);
        register_profile(&target.launcher_root, &name, profile).await?;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::core::catalog::{FileHashes, ReleaseChannel, ReleaseFile};
    use crate::core::downloader::{AtomicProgress, NoProgress};
    use crate::core::launcher::LauncherProfiles;
    use crate::core::mrpack::extract::tests::build_pack;
    use crate::core::state::LoaderEndpoints;

    fn index_json(server: &str) -> String {
        format!(
            r#"{{
                "formatVersion": 1,
                "game": "minecraft",
                "versionId": "1.0.0",
                "name": "Test Pack",
                "dependencies": {{ "minecraft": "1.20.1", "quilt-loader": "0.20.0" }},
                "files": [
                    {{
                        "path": "mods/required.jar",
                        "hashes": {{ "sha1": "a" }},
                        "fileSize": 8,
                        "downloads": ["{server}/missing.jar", "{server}/required.jar"]
                    }},
                    {{
                        "path": "mods/optional.jar",
                        "hashes": {{ "sha1": "b" }},
                        "fileSize": 8,
                        "env": {{ "client": "optional", "server": "optional" }},
                        "downloads": ["{server}/optional.jar"]
                    }},
                    {{
                        "path": "mods/server-only.jar",
                        "hashes": {{ "sha1": "c" }},
                        "fileSize": 8,
                        "env": {{ "client": "unsupported", "server": "required" }},
                        "downloads": ["{server}/server-only.jar"]
                    }},
                    {{
                        "path": "mods/broken.jar",
                        "hashes": {{ "sha1": "d" }},
                        "fileSize": 8,
                        "downloads": ["{server}/gone.jar"]
                    }}
                ]
            }}"#
        )
    }

    async fn serve(server: &MockServer, route: &str, status: u16, body: &[u8], times: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_bytes(body.to_vec()))
            .expect(times)
            .mount(server)
            .await;
    }

    async fn mock_pack_server() -> MockServer {
        let server = MockServer::start().await;
        let pack = build_pack(&[
            ("modrinth.index.json", index_json(&server.uri()).as_bytes()),
            ("overrides/config/a.txt", b"generic"),
            ("client-overrides/config/a.txt", b"client"),
            ("overrides/options.txt", b"fov:90"),
        ]);
        serve(&server, "/pack.mrpack", 200, &pack, 1).await;
        serve(&server, "/missing.jar", 404, b"", 1).await;
        serve(&server, "/required.jar", 200, b"required", 1).await;
        serve(&server, "/optional.jar", 200, b"optional", 0).await;
        serve(&server, "/server-only.jar", 200, b"server", 0).await;
        serve(&server, "/gone.jar", 500, b"", 1).await;
        serve(&server, "/quilt/1.20.1/0.20.0", 200, br#"{"id":"quilt"}"#, 1).await;
        server
    }

    fn record(server: &MockServer) -> ReleaseRecord {
        ReleaseRecord {
            id: Some("abc".into()),
            name: None,
            version_number: Some("1.0.0".into()),
            game_versions: vec!["1.20.1".into()],
            files: vec![ReleaseFile {
                url: format!("{}/pack.mrpack", server.uri()),
                primary: true,
                filename: None,
                hashes: FileHashes::default(),
                size: 0,
            }],
            channel: ReleaseChannel::Release,
            date_published: None,
        }
    }

    fn config(server: &MockServer) -> InstallerConfig {
        InstallerConfig {
            display_name: "Test".into(),
            endpoints: LoaderEndpoints {
                quilt: format!("{}/quilt/{{game_version}}/{{loader_version}}", server.uri()),
                ..LoaderEndpoints::default()
            },
            ..InstallerConfig::default()
        }
    }

    #[tokio::test]
    async fn full_install_tolerates_a_broken_mod() {
        let server = mock_pack_server().await;
        let config = config(&server);
        let root = tempfile::tempdir().unwrap();
        let target = InstallTarget {
            game_version: "1.20.1".into(),
            launcher_root: root.path().to_path_buf(),
            game_dir: root.path().join("pack"),
        };
        let progress = AtomicProgress::new();

        let report = InstallPipeline::new(&config, Client::new())
            .install(&record(&server), &target, &progress)
            .await
            .unwrap();

        let game_dir = &target.game_dir;
        assert_eq!(std::fs::read_to_string(game_dir.join("config/a.txt")).unwrap(), "client");
        assert_eq!(std::fs::read_to_string(game_dir.join("mods/required.jar")).unwrap(), "required");
        assert!(!game_dir.join("mods/optional.jar").exists());
        assert!(!game_dir.join("mods/server-only.jar").exists());
        assert!(!game_dir.join("mods/broken.jar").exists());

        assert_eq!(report.mods.installed, 1);
        assert_eq!(report.mods.skipped, 2);
        assert_eq!(report.mods.failed.len(), 1);
        assert_eq!(report.mods.failed[0].path, PathBuf::from("mods/broken.jar"));
        assert_eq!(report.loader.profile_id, "quilt-loader-0.20.0-1.20.1");
        assert!(!report.loader_already_installed);
        assert_eq!(report.launcher_profile.as_deref(), Some("Test 1.20.1"));
        assert_eq!(progress.get(), Progress::Fraction(1.0));

        assert!(root
            .path()
            .join("versions/quilt-loader-0.20.0-1.20.1/quilt-loader-0.20.0-1.20.1.json")
            .is_file());
        let profiles = LauncherProfiles::load(&LauncherProfiles::path(root.path())).await;
        assert_eq!(
            profiles.profiles["Test 1.20.1"]["lastVersionId"],
            "quilt-loader-0.20.0-1.20.1"
        );
    }

    #[tokio::test]
    async fn optional_files_follow_the_policy() {
        let server = MockServer::start().await;
        serve(&server, "/optional.jar", 200, b"optional", 1).await;
        serve(&server, "/other.jar", 200, b"other", 0).await;

        let json = format!(
            r#"{{
                "dependencies": {{}},
                "files": [
                    {{ "path": "mods/optional.jar", "hashes": {{ "sha1": "b" }}, "fileSize": 8,
                       "env": {{ "client": "optional" }}, "downloads": ["{0}/optional.jar"] }},
                    {{ "path": "mods/other.jar", "hashes": {{ "sha1": "c" }}, "fileSize": 5,
                       "env": {{ "client": "optional" }}, "downloads": ["{0}/other.jar"] }}
                ]
            }}"#,
            server.uri()
        );
        let index = serde_json::from_str(&json).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let manifest =
            PackManifest::from_index(index, crate::core::mrpack::Side::Client, dir.path()).unwrap();

        let asked = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&asked);
        let config = InstallerConfig::default();
        let pipeline = InstallPipeline::new(&config, Client::new()).with_optional_policy(move |f| {
            counter.fetch_add(1, Ordering::SeqCst);
            f.relative_path.ends_with("optional.jar")
        });

        let summary = pipeline.install_mods(&manifest, dir.path(), &NoProgress).await;

        assert_eq!(asked.load(Ordering::SeqCst), 2);
        assert_eq!(summary.installed, 1);
        assert_eq!(summary.skipped, 1);
        assert!(dir.path().join("mods/optional.jar").is_file());
        assert!(!dir.path().join("mods/other.jar").exists());
    }

    #[tokio::test]
    async fn each_file_reports_within_its_share_of_the_mods_stage() {
        let server = MockServer::start().await;
        let bodies: [&[u8]; 3] = [b"first-jar", b"second", b"third-file-bytes"];
        let mut files = Vec::new();
        for (i, body) in bodies.iter().enumerate() {
            serve(&server, &format!("/mod{i}.jar"), 200, body, 1).await;
            files.push(format!(
                r#"{{ "path": "mods/mod{i}.jar", "hashes": {{ "sha1": "x" }}, "fileSize": {},
                     "downloads": ["{}/mod{i}.jar"] }}"#,
                body.len(),
                server.uri()
            ));
        }
        let json = format!(r#"{{ "dependencies": {{}}, "files": [{}] }}"#, files.join(","));
        let dir = tempfile::tempdir().unwrap();
        let manifest = PackManifest::from_index(
            serde_json::from_str(&json).unwrap(),
            crate::core::mrpack::Side::Client,
            dir.path(),
        )
        .unwrap();

        let seen = Mutex::new(Vec::new());
        let recorder = |_: Option<&str>, p: Progress| {
            if let Progress::Fraction(f) = p {
                seen.lock().unwrap().push(f);
            }
        };
        let sink: &dyn ProgressSink = &recorder;
        let config = InstallerConfig::default();
        let summary = InstallPipeline::new(&config, Client::new())
            .install_mods(&manifest, dir.path(), &sink.subprogress(MODS.0, MODS.1))
            .await;
        assert_eq!(summary.installed, 3);

        let span = MODS.1 - MODS.0;
        let bound = |i: usize| MODS.0 + span * i as f32 / 3.0;
        let seen = seen.into_inner().unwrap();
        assert!(!seen.is_empty());

        let mut file = 0;
        for value in &seen {
            while file < 2 && *value > bound(file + 1) + 1e-5 {
                file += 1;
            }
            assert!(
                *value >= bound(file) - 1e-5 && *value <= bound(file + 1) + 1e-5,
                "{value} outside file {file} range"
            );
        }
        // every file ran to completion at the end of its own range
        for i in 1..=3 {
            assert!(
                seen.iter().any(|v| (v - bound(i)).abs() < 1e-5),
                "file {} never reached {}",
                i - 1,
                bound(i)
            );
        }
    }

    #[tokio::test]
    async fn missing_primary_file_aborts_before_download() {
        let server = MockServer::start().await;
        let config = config(&server);
        let mut record = record(&server);
        record.files[0].primary = false;
        let root = tempfile::tempdir().unwrap();
        let target = InstallTarget {
            game_version: "1.20.1".into(),
            launcher_root: root.path().to_path_buf(),
            game_dir: root.path().join("pack"),
        };

        let err = InstallPipeline::new(&config, Client::new())
            .install(&record, &target, &NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, InstallerError::NoPrimaryFile(_)));
        assert!(!target.game_dir.exists());
    }

    #[tokio::test]
    async fn unsupported_loader_fails_before_staging() {
        let root = tempfile::tempdir().unwrap();
        let pack = build_pack(&[(
            "modrinth.index.json",
            br#"{ "dependencies": { "minecraft": "1.20.1", "forge": "47.1.0" }, "files": [] }"#,
        )]);
        let config = InstallerConfig::default();
        let target = InstallTarget {
            game_version: "1.20.1".into(),
            launcher_root: root.path().to_path_buf(),
            game_dir: root.path().join("pack"),
        };

        let err = InstallPipeline::new(&config, Client::new())
            .install_archive(Cursor::new(pack), &target, &NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, InstallerError::UnsupportedLoader(_)));
        assert!(!root.path().join("versions").exists());
        assert!(!root.path().join("launcher_profiles.json").exists());
    }

    #[tokio::test]
    async fn registry_failure_does_not_fail_install() {
        let server = MockServer::start().await;
        serve(&server, "/quilt/1.20.1/0.20.0", 200, br#"{"id":"quilt"}"#, 1).await;
        let config = config(&server);
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("launcher_profiles.json")).unwrap();

        let pack = build_pack(&[(
            "modrinth.index.json",
            br#"{ "dependencies": { "minecraft": "1.20.1", "quilt-loader": "0.20.0" }, "files": [] }"#,
        )]);
        let target = InstallTarget {
            game_version: "1.20.1".into(),
            launcher_root: root.path().to_path_buf(),
            game_dir: root.path().join("pack"),
        };

        let report = InstallPipeline::new(&config, Client::new())
            .install_archive(Cursor::new(pack), &target, &NoProgress)
            .await
            .unwrap();

        assert!(report.launcher_profile.is_none());
        assert_eq!(report.loader.profile_id, "quilt-loader-0.20.0-1.20.1");
    }
}
