// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Header block placed at the start of the ROM image.
//!
//! The header holds the offsets of selected regions, manual byte injections
//! and bytes set depending on the devices a machine uses.

use std::collections::BTreeMap;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use mra_config::{GameRecord, HeaderConfig, MachineFilter};

use crate::{Error, Result};

/// Builds the header bytes
pub fn build_header(
    cfg: &HeaderConfig,
    region_offsets: &BTreeMap<String, usize>,
    game: &GameRecord,
) -> Result<Vec<u8>> {
    let mut header = vec![cfg.fill; cfg.len];

    let mut missing = Vec::new();
    let mut pos = cfg.offset.start;
    for region in cfg.offset.regions.iter() {
        let offset = match region_offsets.get(region) {
            Some(offset) => *offset,
            None => {
                missing.push(region.as_str());
                0
            }
        };
        let value = (offset >> cfg.offset.bits) as u16;
        let bytes = if cfg.offset.reverse {
            value.to_le_bytes()
        } else {
            value.to_be_bytes()
        };
        write_bytes(&mut header, pos, &bytes, game)?;
        pos += 2;
    }
    if !missing.is_empty() {
        warn!(
            "Missing region(s) {}. Offset set to zero in the header ({})",
            missing.join(" "),
            game.name
        );
    }

    for data in cfg.data.iter().filter(|d| d.applies_to(game)) {
        if !data.dev.is_empty() && !game.has_device(&data.dev) {
            continue;
        }
        let bytes = parse_hex_bytes(&data.data)?;
        write_bytes(&mut header, data.offset, &bytes, game)?;
    }

    for dev in cfg.dev.iter().filter(|d| game.has_device(&d.dev)) {
        write_bytes(&mut header, dev.byte, &[dev.value], game)?;
    }

    Ok(header)
}

fn write_bytes(header: &mut [u8], offset: usize, bytes: &[u8], game: &GameRecord) -> Result<()> {
    let len = header.len();
    let dest = header
        .get_mut(offset..offset + bytes.len())
        .ok_or_else(|| Error::HeaderOverflow {
            machine: game.name.clone(),
            offset: offset + bytes.len() - 1,
            len,
        })?;
    dest.copy_from_slice(bytes);
    Ok(())
}

/// Parses whitespace separated hex bytes
pub fn parse_hex_bytes(text: &str) -> Result<Vec<u8>> {
    text.split_whitespace()
        .map(|token| {
            u8::from_str_radix(token, 16).map_err(|_| Error::InvalidNumber {
                what: "hex byte".to_string(),
                value: token.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mra_config::{DeviceRef, LayoutConfig, Macros};

    fn header_config(json: &str) -> HeaderConfig {
        let json = format!(r#"{{ "header": {json} }}"#);
        LayoutConfig::from_json(&json, &Macros::new()).unwrap().header
    }

    fn game() -> GameRecord {
        GameRecord {
            name: "aliensyn3".to_string(),
            clone_of: "aliensyn".to_string(),
            devices: vec![DeviceRef {
                name: "fd1089a".to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_offset_table() {
        let cfg = header_config(
            r#"{ "len": 8, "fill": 255, "offset": { "bits": 8, "start": 2, "regions": ["gfx", "snd", "nope"] } }"#,
        );
        let offsets = BTreeMap::from([
            ("gfx".to_string(), 0x12300),
            ("snd".to_string(), 0x4500),
        ]);
        let header = build_header(&cfg, &offsets, &game()).unwrap();
        assert_eq!(header, vec![0xff, 0xff, 0x01, 0x23, 0x00, 0x45, 0x00, 0x00]);
    }

    #[test]
    fn test_reverse_offsets() {
        let cfg = header_config(r#"{ "len": 2, "offset": { "reverse": true, "regions": ["gfx"] } }"#);
        let offsets = BTreeMap::from([("gfx".to_string(), 0x1234)]);
        assert_eq!(build_header(&cfg, &offsets, &game()).unwrap(), vec![0x34, 0x12]);
    }

    #[test]
    fn test_data_and_devices() {
        let cfg = header_config(
            r#"{ "len": 4, "fill": 0,
                 "data": [ { "machine": "aliensyn", "pointer": 1, "data": "aa bb" },
                           { "setname": "other", "offset": 0, "data": "11" },
                           { "dev": "mc8123", "offset": 0, "data": "22" } ],
                 "dev": [ { "byte": 3, "value": 7, "dev": "fd1089a" } ] }"#,
        );
        let header = build_header(&cfg, &BTreeMap::new(), &game()).unwrap();
        assert_eq!(header, vec![0x00, 0xaa, 0xbb, 0x07]);
    }

    #[test]
    fn test_overflow() {
        let cfg = header_config(r#"{ "len": 2, "data": [ { "offset": 1, "data": "01 02" } ] }"#);
        assert!(matches!(
            build_header(&cfg, &BTreeMap::new(), &game()),
            Err(Error::HeaderOverflow { offset: 2, len: 2, .. })
        ));
    }
}
