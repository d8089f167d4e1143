// SPDX-License-Identifier: MIT OR Apache-2.0
//! `clustertopo` - Cluster topology pipeline
//!
//! Reads a RON scene of points and edges and runs it through:
//! - Concurrent edge insertion with deduplication
//! - Connected-component extraction with size limits
//! - Chain decomposition
//! - Planar face enumeration, cell validation and face adjacency
//!
//! ```text
//! clustertopo <scene.ron> [config.ron] [report.json]
//! ```
//!
//! Without a configuration file the defaults are used. The report is
//! printed to stdout when no output path is given.

mod config;
mod error;
mod pipeline;
mod report;
mod scene;

use clap::Parser;
use config::PipelineConfig;
use error::Result;
use pipeline::Pipeline;
use scene::Scene;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "clustertopo", version)]
#[command(about = "Split a RON scene into clusters, chains and planar cells")]
struct Args {
    /// Scene file (RON)
    scene: PathBuf,

    /// Pipeline configuration (RON); defaults are used when omitted
    config: Option<PathBuf>,

    /// Report path (JSON); printed to stdout when omitted
    output: Option<PathBuf>,
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            tracing::debug!("Loading config from {:?}", path);
            PipelineConfig::load(path)?
        }
        None => PipelineConfig::default(),
    };

    tracing::debug!("Loading scene from {:?}", args.scene);
    let scene = Scene::load(&args.scene)?;
    tracing::info!("Scene has {} points and {} edges", scene.positions.len(), scene.edge_count());

    let report = Pipeline::new(config)?.run(&scene)?;
    report.log_summary();

    match &args.output {
        Some(path) => {
            report.save(path)?;
            tracing::info!("Report written to {:?}", path);
        }
        None => println!("{}", report.to_json()?),
    }
    Ok(())
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("clustertopo_app=info,clustertopo_graph=info,clustertopo_artifacts=info")
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting clustertopo v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(Args::parse()) {
        tracing::error!("clustertopo failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> std::result::Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("clustertopo").chain(list.iter().copied()))
    }

    #[test]
    fn test_parse_args() {
        let parsed = args(&["scene.ron"]).unwrap();
        assert_eq!(parsed.scene, PathBuf::from("scene.ron"));
        assert!(parsed.config.is_none() && parsed.output.is_none());

        let parsed = args(&["scene.ron", "config.ron", "out.json"]).unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("config.ron")));
        assert_eq!(parsed.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_bad_args() {
        assert_eq!(
            args(&[]).unwrap_err().kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
        assert!(args(&["a", "b", "c", "d"]).is_err());
    }

    #[test]
    fn test_run_writes_report() {
        let dir = std::env::temp_dir().join(format!("clustertopo-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let scene_path = dir.join("scene.ron");
        let config_path = dir.join("config.ron");
        let output_path = dir.join("report.json");

        std::fs::write(
            &scene_path,
            "(positions: [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0)], edges: [(0, 1), (1, 2), (2, 0)])",
        )
        .unwrap();
        let config = PipelineConfig {
            worker_threads: 1,
            ..Default::default()
        };
        std::fs::write(&config_path, config.to_ron().unwrap()).unwrap();

        run(Args {
            scene: scene_path,
            config: Some(config_path),
            output: Some(output_path.clone()),
        })
        .unwrap();

        let json = std::fs::read_to_string(&output_path).unwrap();
        let report: report::Report = serde_json::from_str(&json).unwrap();
        assert_eq!(report.clusters.len(), 1);
        assert_eq!(report.clusters[0].cells.len(), 1);
        assert!((report.clusters[0].cells[0].area - 0.5).abs() < 1e-9);

        std::fs::remove_dir_all(&dir).ok();
    }
}
