use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::core::catalog::{CatalogClient, GameVersionIndex, ModrinthCatalog};
use crate::core::downloader::{Progress, ProgressSink};
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::http::build_http_client;
use crate::core::install::{InstallPipeline, InstallReport, InstallTarget};
use crate::core::state::InstallerConfig;

const BAR_LENGTH: u64 = 1000;

/// Install a Modrinth modpack into the vanilla Minecraft launcher.
#[derive(Parser)]
#[command(name = "mrpack-installer", version, long_about = None)]
pub struct Cli {
    /// JSON config file; absent keys keep their defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List game versions the modpack has a release for
    Versions,
    /// Download and install the release for a game version
    Install {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Install from a local .mrpack file
    InstallFile {
        path: PathBuf,
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(Args)]
pub struct TargetArgs {
    /// Minecraft version to install for
    #[arg(short, long)]
    pub game_version: String,
    /// Launcher data directory (defaults to the platform's .minecraft)
    #[arg(long)]
    pub launcher_root: Option<PathBuf>,
    /// Game directory for the profile
    #[arg(long)]
    pub game_dir: Option<PathBuf>,
    /// Also install files the pack marks optional
    #[arg(long)]
    pub install_optional: bool,
    /// Check SHA-1 of every downloaded file
    #[arg(long)]
    pub verify_checksums: bool,
}

pub async fn handle(cli: Cli) -> InstallerResult<()> {
    let mut config = match &cli.config {
        Some(path) => InstallerConfig::load(path)?,
        None => InstallerConfig::default(),
    };

    match cli.command {
        Commands::Versions => list_versions(&config).await,
        Commands::Install { target } => {
            apply_flags(&mut config, &target);
            install_release(&config, &target).await
        }
        Commands::InstallFile { path, target } => {
            apply_flags(&mut config, &target);
            install_file(&config, &path, &target).await
        }
    }
}

fn apply_flags(config: &mut InstallerConfig, args: &TargetArgs) {
    config.install_optional |= args.install_optional;
    config.verify_checksums |= args.verify_checksums;
    if let Some(root) = &args.launcher_root {
        config.launcher_root = Some(root.clone());
    }
}

fn resolve_target(config: &InstallerConfig, args: &TargetArgs) -> InstallTarget {
    let launcher_root = config.launcher_root();
    let game_dir = args
        .game_dir
        .clone()
        .unwrap_or_else(|| config.default_game_dir(&launcher_root, &args.game_version));
    InstallTarget {
        game_version: args.game_version.clone(),
        launcher_root,
        game_dir,
    }
}

async fn load_index(config: &InstallerConfig) -> InstallerResult<GameVersionIndex> {
    let client = build_http_client(config)?;
    let catalog = ModrinthCatalog::new(client, config);
    Ok(GameVersionIndex::build(catalog.fetch_releases().await?))
}

async fn list_versions(config: &InstallerConfig) -> InstallerResult<()> {
    let index = load_index(config).await?;
    for version in index.available_versions() {
        let label = index.get(version).map(|r| r.label()).unwrap_or_default();
        println!("{version}\t{label}");
    }
    Ok(())
}

async fn install_release(config: &InstallerConfig, args: &TargetArgs) -> InstallerResult<()> {
    let index = load_index(config).await?;
    let record = index.get(&args.game_version).ok_or_else(|| {
        InstallerError::Other(format!(
            "No release for Minecraft {} (available: {})",
            args.game_version,
            index.available_versions().join(", ")
        ))
    })?;

    let target = resolve_target(config, args);
    let pipeline = InstallPipeline::new(config, build_http_client(config)?);
    let bar = BarProgress::new();
    let report = pipeline.install(record, &target, &bar).await;
    bar.finish();
    print_report(&report?, &target);
    Ok(())
}

async fn install_file(config: &InstallerConfig, path: &Path, args: &TargetArgs) -> InstallerResult<()> {
    let file = File::open(path).map_err(|e| InstallerError::io(path, e))?;
    info!("Installing local pack {:?}", path);

    let target = resolve_target(config, args);
    let pipeline = InstallPipeline::new(config, build_http_client(config)?);
    let bar = BarProgress::new();
    let report = pipeline
        .install_archive(BufReader::new(file), &target, &bar)
        .await;
    bar.finish();
    print_report(&report?, &target);
    Ok(())
}

fn print_report(report: &InstallReport, target: &InstallTarget) {
    println!(
        "Installed into {} with {} {}",
        target.game_dir.display(),
        report.loader.kind,
        report.loader.loader_version
    );
    println!(
        "Mods: {} installed, {} skipped, {} failed",
        report.mods.installed,
        report.mods.skipped,
        report.mods.failed.len()
    );
    for failure in &report.mods.failed {
        println!("  {}: {}", failure.path.display(), failure.error);
    }
    match &report.launcher_profile {
        Some(name) => println!("Launcher profile: {name}"),
        None => println!("Launcher profile was not registered; see log"),
    }
}

/// Terminal progress bar driven by the install pipeline.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(BAR_LENGTH);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {percent}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for BarProgress {
    fn update(&self, message: Option<&str>, progress: Progress) {
        if let Some(message) = message {
            self.bar.set_message(message.to_string());
        }
        match progress {
            Progress::Fraction(p) => self.bar.set_position((p * BAR_LENGTH as f32) as u64),
            Progress::Indeterminate => self.bar.tick(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_flags_parse() {
        let cli = Cli::try_parse_from([
            "mrpack-installer",
            "install",
            "--game-version",
            "1.20.1",
            "--install-optional",
            "--launcher-root",
            "/tmp/mc",
        ])
        .unwrap();

        let Commands::Install { target } = cli.command else {
            panic!("expected install");
        };
        assert_eq!(target.game_version, "1.20.1");
        assert!(target.install_optional);
        assert!(!target.verify_checksums);

        let mut config = InstallerConfig::default();
        apply_flags(&mut config, &target);
        let resolved = resolve_target(&config, &target);
        assert!(config.install_optional);
        assert_eq!(resolved.launcher_root, PathBuf::from("/tmp/mc"));
        assert_eq!(
            resolved.game_dir,
            PathBuf::from("/tmp/mc").join(&config.project).join("1.20.1")
        );
    }

    #[test]
    fn install_file_takes_a_path_and_config() {
        let cli = Cli::try_parse_from([
            "mrpack-installer",
            "install-file",
            "pack.mrpack",
            "-g",
            "1.8.9",
            "--config",
            "cfg.json",
            "--game-dir",
            "/games/pack",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("cfg.json")));
        let Commands::InstallFile { path, target } = cli.command else {
            panic!("expected install-file");
        };
        assert_eq!(path, PathBuf::from("pack.mrpack"));
        let resolved = resolve_target(&InstallerConfig::default(), &target);
        assert_eq!(resolved.game_dir, PathBuf::from("/games/pack"));
    }

    #[test]
    fn game_version_is_required() {
        assert!(Cli::try_parse_from(["mrpack-installer", "install"]).is_err());
    }
}
