// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use clap::Parser;
use std::path::PathBuf;

use crate::macros::parse_define;

#[derive(Debug, Parser)]
#[command(
    name = "mra",
    about = "Generates MiSTer MRA descriptors for an arcade core",
    version
)]
pub struct Args {
    /// Core layout configuration (JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Game records to process (JSON array)
    #[arg(short, long)]
    pub games: PathBuf,

    /// Core macro definitions, one NAME=value per line
    #[arg(short, long)]
    pub macros: Option<PathBuf>,

    /// Defines a macro, overriding the macro file
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUE", value_parser = parse_define)]
    pub defines: Vec<(String, String)>,

    /// Directory the main descriptors are written to
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Directory for alternative descriptors [default: <OUTPUT>/_alternatives]
    #[arg(long)]
    pub altdir: Option<PathBuf>,

    /// Directory searched for ROM zip files.  When given, ROM images are
    /// built and written alongside the descriptors.
    #[arg(short = 'z', long = "zip-dir")]
    pub zip_dirs: Vec<PathBuf>,

    /// Directory the .rom and .mod files are written to
    #[arg(long, default_value = "rom")]
    pub rom_dir: PathBuf,

    /// Directory holding custom firmware sources (<setname>.s)
    #[arg(long)]
    pub firmware_dir: Option<PathBuf>,

    /// Adds an info tag to every descriptor
    #[arg(long = "info", value_name = "TAG=VALUE", value_parser = parse_define)]
    pub info: Vec<(String, String)>,

    /// Comma separated button names, overriding the configuration
    #[arg(long)]
    pub buttons: Option<String>,

    /// MAME version the game records were extracted from
    #[arg(long, default_value = "")]
    pub mame_version: String,

    /// Only process these setnames
    #[arg(short, long = "setname")]
    pub setnames: Vec<String>,

    /// Print descriptors to stdout instead of writing files
    #[arg(short, long)]
    pub print: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn altdir(&self) -> PathBuf {
        self.altdir
            .clone()
            .unwrap_or_else(|| self.output.join("_alternatives"))
    }

    /// True if ROM images should be built
    pub fn build_roms(&self) -> bool {
        !self.zip_dirs.is_empty()
    }

    pub fn wanted(&self, setname: &str) -> bool {
        self.setnames.is_empty() || self.setnames.iter().any(|s| s == setname)
    }
}
