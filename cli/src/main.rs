//! plantuml - generate images from PlantUML files using a PlantUML server.
//!
//! # Usage
//!
//! ```bash
//! plantuml diagrams/*.puml
//! plantuml -o build/images -s http://localhost:8080/plantuml/img/ seq.puml
//! plantuml --config server.json seq.puml
//! plantuml --url seq.puml
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use plantuml_core::{client, FileOptions, PlantUml, ServerConfig, DEFAULT_SERVER_URL};

/// Generate images from PlantUML files using a PlantUML server
#[derive(Parser, Debug)]
#[command(name = "plantuml", version, about, long_about = None)]
struct Cli {
    /// File(s) to generate images from
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Directory to put the generated files into
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Server to generate from [default: http://www.plantuml.com/plantuml/img/]
    #[arg(short, long, value_name = "URL")]
    server: Option<String>,

    /// JSON file with server url, auth and proxy settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the image URL of each file instead of fetching it
    #[arg(long)]
    url: bool,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
struct FileReport {
    filename: String,
    gen_success: bool,
}

fn server_config(cli: &Cli) -> Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_json_file(path)
            .with_context(|| format!("failed to load server config from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(server) = &cli.server {
        config.url = server.clone();
    }
    if config.proxy.is_none() {
        config = config.with_env_proxy();
    }
    Ok(config)
}

fn print_urls(cli: &Cli, config: &ServerConfig) -> Result<()> {
    for file in &cli.files {
        let text = std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
        println!("{}", client::image_url(&config.url, &text));
    }
    Ok(())
}

fn render_all(cli: &Cli, config: ServerConfig) -> Result<Vec<FileReport>> {
    let plantuml = PlantUml::new(config).context("failed to set up PlantUML session")?;
    let options = FileOptions {
        directory: cli.out.clone(),
        ..FileOptions::default()
    };

    let mut reports = Vec::with_capacity(cli.files.len());
    for file in &cli.files {
        let gen_success = plantuml
            .process_file(file, &options)
            .with_context(|| format!("failed to process {}", file.display()))?;
        info!(file = %file.display(), gen_success, "processed file");
        reports.push(FileReport {
            filename: file.display().to_string(),
            gen_success,
        });
    }
    Ok(reports)
}

/// Directives from `RUST_LOG`, or `warn` when it is unset or empty.
fn env_filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives.unwrap_or_default())
}

fn main() -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(rust_log.as_deref()))
        .init();

    let cli = Cli::parse();
    let config = server_config(&cli)?;

    if cli.url {
        return print_urls(&cli, &config);
    }

    let reports = render_all(&cli, config)?;
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_at_least_one_file() {
        assert!(Cli::try_parse_from(["plantuml"]).is_err());
    }

    #[test]
    fn parses_short_flags() {
        let cli = Cli::try_parse_from(["plantuml", "-o", "out", "-s", "http://localhost/img/", "a.puml", "b.puml"]).unwrap();
        assert_eq!(cli.files, vec![PathBuf::from("a.puml"), PathBuf::from("b.puml")]);
        assert_eq!(cli.out, Some(PathBuf::from("out")));
        assert_eq!(cli.server.as_deref(), Some("http://localhost/img/"));
        assert!(!cli.url);
    }

    #[test]
    fn server_flag_overrides_default() {
        let cli = Cli::try_parse_from(["plantuml", "--server", "http://localhost/img/", "a.puml"]).unwrap();
        assert_eq!(server_config(&cli).unwrap().url, "http://localhost/img/");

        let cli = Cli::try_parse_from(["plantuml", "a.puml"]).unwrap();
        assert_eq!(server_config(&cli).unwrap().url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn server_flag_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.json");
        std::fs::write(
            &path,
            r#"{"url":"http://from-file/img/","auth":{"type":"basic","username":"me","password":"secret"},"proxy":"http://proxy:3128"}"#,
        )
        .unwrap();

        let config_arg = path.to_str().unwrap();
        let cli = Cli::try_parse_from(["plantuml", "-c", config_arg, "-s", "http://flag/img/", "a.puml"]).unwrap();
        let config = server_config(&cli).unwrap();
        assert_eq!(config.url, "http://flag/img/");
        assert_eq!(config.proxy.as_deref(), Some("http://proxy:3128"));
        assert_eq!(
            config.auth,
            plantuml_core::AuthMode::Basic(plantuml_core::BasicAuth {
                username: "me".to_string(),
                password: "secret".to_string(),
            })
        );
    }

    #[test]
    fn log_filter_defaults_to_warn() {
        assert_eq!(env_filter(None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(env_filter(Some("")).max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn log_filter_honours_debug_directive() {
        assert_eq!(env_filter(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(
            env_filter(Some("plantuml_core=debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }

    #[test]
    fn report_serializes_like_the_summary_line() {
        let report = FileReport {
            filename: "a.puml".to_string(),
            gen_success: true,
        };
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"filename":"a.puml","gen_success":true}"#
        );
    }
}
