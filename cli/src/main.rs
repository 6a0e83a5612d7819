// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! mra - generates MiSTer MRA descriptors, and optionally the ROM images
//! they describe, for the machines an arcade core supports.

mod archive;
mod args;
mod macros;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use mra_config::{Extractor, GameFilter, GameRecord, InfoTag, JsonExtractor, LayoutConfig};
use mra_gen::{
    As31, Descriptor, DescriptorOptions, FirmwareAssembler, NoFirmware, make_descriptor,
    materialize, materialize_coremod,
};
use std::fs;

use archive::ZipDirectories;
use args::Args;
use macros::load_macros;
use output::Output;

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    run(&args)
}

#[derive(Debug, Default)]
struct Summary {
    written: usize,
    skipped: usize,
    orphans: usize,
    incomplete: usize,
}

fn run(args: &Args) -> Result<()> {
    let macros = load_macros(args.macros.as_deref(), &args.defines)?;

    let json = fs::read_to_string(&args.config)
        .with_context(|| format!("Cannot read {}", args.config.display()))?;
    let cfg = LayoutConfig::from_json(&json, &macros)
        .with_context(|| format!("Invalid configuration in {}", args.config.display()))?;

    let json = fs::read_to_string(&args.games)
        .with_context(|| format!("Cannot read {}", args.games.display()))?;
    let mut games = JsonExtractor::from_json(&json)
        .with_context(|| format!("Invalid game records in {}", args.games.display()))?;
    info!("Processing {} game records", games.remaining());

    let firmware: Box<dyn FirmwareAssembler> = match &args.firmware_dir {
        Some(dir) => Box::new(As31::new(dir)),
        None => Box::new(NoFirmware),
    };
    let opts = DescriptorOptions {
        mame_version: args.mame_version.clone(),
        extra_info: args
            .info
            .iter()
            .map(|(tag, value)| InfoTag {
                tag: tag.clone(),
                value: value.clone(),
            })
            .collect(),
        buttons: args.buttons.clone(),
    };
    let zips = ZipDirectories::new(args.zip_dirs.clone());
    let output = Output {
        mra_dir: args.output.clone(),
        alt_dir: args.altdir(),
        rom_dir: args.rom_dir.clone(),
    };

    let mut filter = GameFilter::new(&cfg.parse);
    let mut summary = Summary::default();
    while let Some(game) = games.next_game() {
        filter.observe(&game);
        if !args.wanted(&game.name) || filter.skip_game(&game) {
            summary.skipped += 1;
            continue;
        }
        if !filter.has_parent(&game) {
            warn!("Skipping {} as its parent {} is unknown", game.name, game.clone_of);
            summary.orphans += 1;
            continue;
        }

        let game = cfg.prepare(game);
        let mut descriptor = make_descriptor(&game, &cfg, &opts, firmware.as_ref())
            .with_context(|| format!("Cannot build the descriptor for {}", game.name))?;

        if args.build_roms() && descriptor.rom_size > 0 {
            if !build_roms(&game, &mut descriptor, &zips, &output)? {
                summary.incomplete += 1;
            }
        }

        if args.print {
            println!("{}", descriptor.root);
        } else {
            let parent = if game.clone_of.is_empty() || filter.is_main(&game) {
                None
            } else {
                Some(
                    filter
                        .parent_description(&game.clone_of)
                        .unwrap_or(&game.clone_of),
                )
            };
            let path = output.write_mra(cfg.parse.display_name(&game), parent, &descriptor)?;
            debug!("{} written to {}", game.name, path.display());
        }
        summary.written += 1;
    }

    info!(
        "{} descriptors generated, {} machines skipped, {} without a known parent",
        summary.written, summary.skipped, summary.orphans
    );
    if summary.incomplete > 0 {
        warn!("{} ROM images could not be built", summary.incomplete);
    }
    Ok(())
}

// Builds and writes the ROM image and core-mod byte.  Returns false if
// files were missing, in which case no ROM image is written.
fn build_roms(
    game: &GameRecord,
    descriptor: &mut Descriptor,
    zips: &ZipDirectories,
    output: &Output,
) -> Result<bool> {
    let image = materialize(&mut descriptor.root, zips)
        .with_context(|| format!("Cannot build the ROM image for {}", game.name))?;
    if image.data.len() != descriptor.rom_size {
        warn!(
            "{}: ROM image is 0x{:X} bytes, expected 0x{:X}",
            game.name,
            image.data.len(),
            descriptor.rom_size
        );
    }
    if !image.is_complete() {
        warn!("{}: missing {}", game.name, image.missing.join(", "));
        return Ok(false);
    }
    output.write_rom(&game.name, "rom", &image.data)?;

    let coremod = materialize_coremod(&descriptor.root)?;
    if !coremod.is_empty() {
        output.write_rom(&game.name, "mod", &coremod)?;
    }
    Ok(true)
}
