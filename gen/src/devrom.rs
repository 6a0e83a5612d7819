// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! ROM data generated for devices rather than dumped.

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use mra_config::{GameRecord, LayoutConfig};

use crate::descriptor::{DescriptorNode, hexdump};
use crate::layout::Cursor;

/// Region name whose rule positions the FD1089 table
pub const FD1089_REGION: &str = "fd1089";

/// Base decryption table of the FD1089 CPU
pub const FD1089_TABLE: [u8; 256] = [
    0x00, 0x1c, 0x76, 0x6a, 0x5e, 0x42, 0x24, 0x38, 0x4b, 0x67, 0xad, 0x81,
    0xe9, 0xc5, 0x03, 0x2f, 0x45, 0x69, 0xaf, 0x83, 0xe7, 0xcb, 0x01, 0x2d,
    0x02, 0x1e, 0x78, 0x64, 0x5c, 0x40, 0x2a, 0x36, 0x32, 0x2e, 0x44, 0x58,
    0xe4, 0xf8, 0x9e, 0x82, 0x29, 0x05, 0xcf, 0xe3, 0x93, 0xbf, 0x79, 0x55,
    0x3f, 0x13, 0xd5, 0xf9, 0x85, 0xa9, 0x63, 0x4f, 0xb8, 0xa4, 0xc2, 0xde,
    0x6e, 0x72, 0x18, 0x04, 0x0c, 0x10, 0x7a, 0x66, 0xfc, 0xe0, 0x86, 0x9a,
    0x47, 0x6b, 0xa1, 0x8d, 0xbb, 0x97, 0x51, 0x7d, 0x17, 0x3b, 0xfd, 0xd1,
    0xeb, 0xc7, 0x0d, 0x21, 0xa0, 0xbc, 0xda, 0xc6, 0x50, 0x4c, 0x26, 0x3a,
    0x3e, 0x22, 0x48, 0x54, 0x46, 0x5a, 0x3c, 0x20, 0x25, 0x09, 0xc3, 0xef,
    0xc1, 0xed, 0x2b, 0x07, 0x6d, 0x41, 0x87, 0xab, 0x89, 0xa5, 0x6f, 0x43,
    0x1a, 0x06, 0x60, 0x7c, 0x62, 0x7e, 0x14, 0x08, 0x0a, 0x16, 0x70, 0x6c,
    0xdc, 0xc0, 0xaa, 0xb6, 0x4d, 0x61, 0xa7, 0x8b, 0xf7, 0xdb, 0x11, 0x3d,
    0x5b, 0x77, 0xbd, 0x91, 0xe1, 0xcd, 0x0b, 0x27, 0x80, 0x9c, 0xf6, 0xea,
    0x56, 0x4a, 0x2c, 0x30, 0xb0, 0xac, 0xca, 0xd6, 0xee, 0xf2, 0x98, 0x84,
    0x37, 0x1b, 0xdd, 0xf1, 0x95, 0xb9, 0x73, 0x5f, 0x39, 0x15, 0xdf, 0xf3,
    0x9b, 0xb7, 0x71, 0x5d, 0xb2, 0xae, 0xc4, 0xd8, 0xec, 0xf0, 0x96, 0x8a,
    0xa8, 0xb4, 0xd2, 0xce, 0xd0, 0xcc, 0xa6, 0xba, 0x1f, 0x33, 0xf5, 0xd9,
    0xfb, 0xd7, 0x1d, 0x31, 0x57, 0x7b, 0xb1, 0x9d, 0xb3, 0x9f, 0x59, 0x75,
    0x8c, 0x90, 0xfa, 0xe6, 0xf4, 0xe8, 0x8e, 0x92, 0x12, 0x0e, 0x68, 0x74,
    0xe2, 0xfe, 0x94, 0x88, 0x65, 0x49, 0x8f, 0xa3, 0x99, 0xb5, 0x7f, 0x53,
    0x35, 0x19, 0xd3, 0xff, 0xc9, 0xe5, 0x23, 0x0f, 0xbe, 0xa2, 0xc8, 0xd4,
    0x4e, 0x52, 0x34, 0x28,
];

/// Appends the device ROMs a machine needs after all regions
pub fn add_device_roms(
    rom: &mut DescriptorNode,
    game: &GameRecord,
    cfg: &LayoutConfig,
    cursor: &mut Cursor,
) {
    if !game.devices.iter().any(|d| d.name.contains(FD1089_REGION)) {
        return;
    }

    let rule = cfg.region_rule(FD1089_REGION, game);
    if let Some(start) = rule.start() {
        let delta = cursor.fill_upto(start, rom);
        if delta < 0 {
            warn!(
                "Start offset overcome by 0x{:X} while adding the FD1089 table ({})",
                -delta, game.name
            );
        }
    }
    rom.add_comment(format!("FD1089 base table starts at 0x{:X}", cursor.pos()));
    rom.add_text_node("part", hexdump(&FD1089_TABLE, 16)).indent_text = true;
    cursor.advance(FD1089_TABLE.len());
}
