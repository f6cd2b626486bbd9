mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use framereel_core::pipeline::{self, PipelineReport};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let config = cli.pipeline_config();

    info!(input = ?cli.image_folder, output = ?cli.output_gif, "starting");

    let report = pipeline::run_pipeline(&cli.image_folder, &cli.output_gif, &config)
        .context("pipeline failed")?;

    match report {
        PipelineReport::NoMatchingInput => {
            println!("No images found in the directory.");
        }
        PipelineReport::Written {
            gif,
            frame_count,
            video,
            frames_dir,
        } => {
            println!("Animated GIF saved as {} ({frame_count} frames)", gif.display());
            if let Some(video) = video {
                println!("MP4 video saved as {}", video.display());
            }
            if let Some(dir) = frames_dir {
                println!("Prepared frames saved in {}", dir.display());
            }
        }
    }

    Ok(())
}
