// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Generates MRA ROM loading descriptors, and the ROM images they imply, for
//! FPGA arcade cores.
//!
//! The [`layout`] compiler turns a [`GameRecord`](mra_config::GameRecord)
//! and a [`LayoutConfig`](mra_config::LayoutConfig) into the ROM section of
//! a [`DescriptorNode`] tree.  [`mra::make_descriptor`] wraps it into a
//! complete descriptor, and [`materialize::materialize`] resolves a
//! descriptor back into bytes from archives.

pub mod archive;
pub mod bytemap;
pub mod descriptor;
pub mod devrom;
pub mod dipsw;
pub mod firmware;
pub mod header;
pub mod layout;
pub mod materialize;
pub mod mra;
pub mod order;

pub use archive::{Archive, ArchiveSet, ArchiveSource, MemoryArchive, MemoryArchives};
pub use bytemap::{ByteMap, Direction};
pub use descriptor::{DescriptorNode, hexdump};
pub use dipsw::{SwitchSection, encode_switches};
pub use firmware::{As31, FirmwareAssembler, NoFirmware};
pub use layout::{Cursor, RomSection, compile_rom_section};
pub use materialize::{RomImage, materialize, materialize_coremod};
pub use mra::{Descriptor, DescriptorOptions, make_descriptor};

/// Error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] mra_config::Error),

    #[error("{machine}: the number of ROMs for the {width}-bit region {region} is not even ({files})")]
    UnevenInterleave {
        machine: String,
        region: String,
        width: u32,
        files: String,
    },

    #[error("{machine}: width {width} is not supported for region {region}")]
    UnsupportedWidth {
        machine: String,
        region: String,
        width: u32,
    },

    #[error("region {region}: fractional interleave of {bytes} bytes in {parts} parts is not valid")]
    InvalidFraction {
        region: String,
        bytes: usize,
        parts: usize,
    },

    #[error("region {region}: fractional output bytes ({output_bytes}) is not a multiple of 2")]
    FracOutputNotEven { region: String, output_bytes: usize },

    #[error("region {region}: unsupported custom device {dev}")]
    UnsupportedCustomDevice { region: String, dev: String },

    #[error("region {region}: {strategy} ordering is not implemented")]
    UnimplementedSort {
        region: String,
        strategy: &'static str,
    },

    #[error("region {region}: invalid regular expression {pattern}: {error}")]
    InvalidRegex {
        region: String,
        pattern: String,
        error: String,
    },

    #[error("{machine}: header byte {offset} falls outside the {len} byte header")]
    HeaderOverflow {
        machine: String,
        offset: usize,
        len: usize,
    },

    #[error("malformed descriptor: {reason}")]
    MalformedDescriptor { reason: String },

    #[error("invalid byte map {map}")]
    InvalidByteMap { map: String },

    #[error("invalid {what}: {value}")]
    InvalidNumber { what: String, value: String },
}

pub type Result<T> = core::result::Result<T, Error>;

pub fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
