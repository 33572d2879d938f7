use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use tracing::info;

use asp_auth::Passwords;
use asp_server::{AppState, AsperitasServer, ServerConfig, StorageConfig};

use crate::cli::*;

const DEFAULT_DATA_DIR: &str = "data";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(cli.config.as_deref(), args),
        Command::Config(args) => cmd_config(cli.config.as_deref(), args),
    }
}

fn cmd_serve(path: Option<&Path>, args: ServeArgs) -> anyhow::Result<()> {
    let config = load_config(path, &args.overrides)?;
    let state = AppState::from_config(&config, Passwords::default())
        .context("failed to initialize storage")?;
    println!(
        "{} Asperitas on {} ({})",
        "▶".green().bold(),
        config.bind_addr.to_string().bold(),
        storage_label(&config.storage).cyan()
    );
    let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
    runtime.block_on(AsperitasServer::new(config, state).serve())?;
    info!("bye");
    Ok(())
}

fn cmd_config(path: Option<&Path>, args: ConfigArgs) -> anyhow::Result<()> {
    let config = load_config(path, &args.overrides)?;
    let source = path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".into());
    println!("{} {}", "# source:".dimmed(), source.dimmed());
    print!("{}", config.to_toml_redacted()?);
    Ok(())
}

fn storage_label(storage: &StorageConfig) -> String {
    match storage {
        StorageConfig::Memory => "memory".into(),
        StorageConfig::File { data_dir } => format!("file: {}", data_dir.display()),
    }
}

/// Read the config file, if any, then apply command-line overrides.
fn load_config(path: Option<&Path>, overrides: &OverrideArgs) -> anyhow::Result<ServerConfig> {
    let base = match path {
        Some(path) => ServerConfig::from_toml_file(path)
            .with_context(|| format!("cannot load {}", path.display()))?,
        None => ServerConfig::default(),
    };
    let config = apply_overrides(base, overrides);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(mut config: ServerConfig, overrides: &OverrideArgs) -> ServerConfig {
    if let Some(bind) = overrides.bind {
        config.bind_addr = bind;
    }
    if let Some(ttl) = overrides.session_ttl_secs {
        config.session_ttl_secs = ttl;
    }
    let current_dir = match &config.storage {
        StorageConfig::File { data_dir } => Some(data_dir.clone()),
        StorageConfig::Memory => None,
    };
    // A data directory on its own implies file storage.
    let kind = overrides.storage.or(overrides.data_dir.as_ref().map(|_| StorageKind::File));
    match kind {
        Some(StorageKind::Memory) => config.storage = StorageConfig::Memory,
        Some(StorageKind::File) => {
            let data_dir = overrides
                .data_dir
                .clone()
                .or(current_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
            config.storage = StorageConfig::File { data_dir };
        }
        None => {}
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_overrides_keeps_config() {
        let config = apply_overrides(ServerConfig::default(), &OverrideArgs::default());
        assert_eq!(config.bind_addr, ServerConfig::default().bind_addr);
        assert_eq!(config.storage, StorageConfig::Memory);
    }

    #[test]
    fn file_storage_defaults_data_dir() {
        let overrides = OverrideArgs {
            storage: Some(StorageKind::File),
            ..OverrideArgs::default()
        };
        let config = apply_overrides(ServerConfig::default(), &overrides);
        assert_eq!(
            config.storage,
            StorageConfig::File {
                data_dir: PathBuf::from(DEFAULT_DATA_DIR)
            }
        );
    }

    #[test]
    fn file_storage_keeps_configured_dir() {
        let base = ServerConfig {
            storage: StorageConfig::File {
                data_dir: "/srv/asp".into(),
            },
            ..ServerConfig::default()
        };
        let overrides = OverrideArgs {
            storage: Some(StorageKind::File),
            ..OverrideArgs::default()
        };
        let config = apply_overrides(base, &overrides);
        assert_eq!(
            config.storage,
            StorageConfig::File {
                data_dir: "/srv/asp".into()
            }
        );
    }

    #[test]
    fn data_dir_implies_file_storage() {
        let overrides = OverrideArgs {
            data_dir: Some("/tmp/asp".into()),
            ..OverrideArgs::default()
        };
        let config = apply_overrides(ServerConfig::default(), &overrides);
        assert_eq!(
            config.storage,
            StorageConfig::File {
                data_dir: "/tmp/asp".into()
            }
        );
    }

    #[test]
    fn memory_overrides_file() {
        let base = ServerConfig {
            storage: StorageConfig::File {
                data_dir: "/srv/asp".into(),
            },
            ..ServerConfig::default()
        };
        let overrides = OverrideArgs {
            storage: Some(StorageKind::Memory),
            bind: Some("127.0.0.1:9000".parse().unwrap()),
            session_ttl_secs: Some(60),
            ..OverrideArgs::default()
        };
        let config = apply_overrides(base, &overrides);
        assert_eq!(config.storage, StorageConfig::Memory);
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.session_ttl_secs, 60);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = load_config(
            Some(Path::new("/nonexistent/asperitas.toml")),
            &OverrideArgs::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/asperitas.toml"));
    }

    #[test]
    fn storage_labels() {
        assert_eq!(storage_label(&StorageConfig::Memory), "memory");
        assert_eq!(
            storage_label(&StorageConfig::File {
                data_dir: "d".into()
            }),
            "file: d"
        );
    }
}
