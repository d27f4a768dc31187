use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(about = "Draws a single shaded triangle through OpenGL")]
pub struct Args {
    /// Path to a json5 scene description (built-in triangle if omitted)
    #[arg(short, long)]
    pub scene: Option<PathBuf>,
    /// Override the surface width
    #[arg(long)]
    pub width: Option<u32>,
    /// Override the surface height
    #[arg(long)]
    pub height: Option<u32>,
    /// Validate the scene and print the composed transform without opening a window
    #[arg(long)]
    pub dry_run: bool,
}
