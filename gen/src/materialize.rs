// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Binary materializer.
//!
//! Resolves a descriptor back into the ROM image it describes, reading the
//! named parts from archives by CRC32.  The digest of the result is stored
//! on the descriptor's `rom` node as `asm_md5`.

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use mra_config::parse_int;

use crate::archive::{ArchiveSet, ArchiveSource};
use crate::bytemap::{ByteMap, interleave};
use crate::descriptor::DescriptorNode;
use crate::header::parse_hex_bytes;
use crate::{Error, Result};

/// A materialized ROM image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomImage {
    pub data: Vec<u8>,
    /// Lower case hex MD5 of `data`
    pub md5: String,
    /// Parts that could not be found.  Their bytes are absent from `data`.
    pub missing: Vec<String>,
}

impl RomImage {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

fn rom_index(index: &'static str) -> impl Fn(&DescriptorNode) -> bool + Copy {
    move |n: &DescriptorNode| !n.comment && n.tag == "rom" && n.attr("index") == Some(index)
}

/// Builds the image described by the `rom` node with index 0, then
/// records its MD5 on that node
pub fn materialize(root: &mut DescriptorNode, source: &dyn ArchiveSource) -> Result<RomImage> {
    let setname = root
        .get_node("setname")
        .map(|n| n.text.clone())
        .ok_or_else(|| Error::MalformedDescriptor {
            reason: "no setname".to_string(),
        })?;
    let rom = root
        .find_mut(rom_index("0"))
        .ok_or_else(|| Error::MalformedDescriptor {
            reason: format!("no ROM with index 0 for {setname}"),
        })?;
    debug!("Materializing ROM for {setname}");

    let archives = ArchiveSet::open(source, rom.attr("zip").unwrap_or_default());
    if archives.is_empty() {
        warn!("No archives found for {setname}");
    }

    let mut builder = Builder {
        archives: Some(&archives),
        missing: Vec::new(),
    };
    let mut data = builder.assemble(rom)?;
    apply_patches(rom, &mut data)?;

    let md5 = format!("{:x}", md5::compute(&data));
    rom.set_attr("asm_md5", md5.as_str());
    debug!("{setname}: 0x{:X} bytes, md5 {md5}", data.len());

    Ok(RomImage {
        data,
        md5,
        missing: builder.missing,
    })
}

/// Builds the core-mod byte from the `rom` node with index 1.  Returns an
/// empty vector if the descriptor has none.
pub fn materialize_coremod(root: &DescriptorNode) -> Result<Vec<u8>> {
    if root.get_node("setname").is_none() {
        return Err(Error::MalformedDescriptor {
            reason: "no setname".to_string(),
        });
    }
    let Some(rom) = root.find(rom_index("1")) else {
        return Ok(Vec::new());
    };
    let mut builder = Builder {
        archives: None,
        missing: Vec::new(),
    };
    builder.assemble(rom)
}

struct Builder<'a> {
    archives: Option<&'a ArchiveSet<'a>>,
    missing: Vec<String>,
}

impl Builder<'_> {
    fn assemble(&mut self, rom: &DescriptorNode) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        for child in rom.children().iter().filter(|c| !c.comment) {
            match child.tag.as_str() {
                "part" => {
                    if let Some(bytes) = self.part(child)? {
                        data.extend_from_slice(&bytes);
                    }
                }
                "interleave" => {
                    if let Some(bytes) = self.interleave(child)? {
                        data.extend_from_slice(&bytes);
                    }
                }
                _ => (),
            }
        }
        Ok(data)
    }

    /// Bytes of a part.  `None` if a named part cannot be found.
    fn part(&mut self, node: &DescriptorNode) -> Result<Option<Vec<u8>>> {
        let Some(name) = node.attr("name") else {
            let repeat = number_attr(node, "repeat")?.unwrap_or(1).max(1);
            return Ok(Some(parse_hex_bytes(&node.text)?.repeat(repeat)));
        };

        let crc = node
            .attr("crc")
            .and_then(|c| u32::from_str_radix(c, 16).ok());
        let file = match (crc, self.archives) {
            (Some(crc), Some(archives)) => archives.find_by_crc32(crc),
            _ => None,
        };
        let Some(file) = file else {
            warn!("Cannot find {name} ({})", node.attr("crc").unwrap_or("no CRC"));
            self.missing.push(name.to_string());
            return Ok(None);
        };

        let offset = number_attr(node, "offset")?.unwrap_or(0).min(file.len());
        let end = match number_attr(node, "length")? {
            Some(length) => (offset + length).min(file.len()),
            None => file.len(),
        };
        trace!("{name}: 0x{offset:X}-0x{end:X}");
        Ok(Some(file[offset..end].to_vec()))
    }

    /// Executes an interleave.  A missing part drops the whole interleave.
    fn interleave(&mut self, node: &DescriptorNode) -> Result<Option<Vec<u8>>> {
        let output = number_attr(node, "output")?.unwrap_or(8);
        let lanes = output / 8;

        let mut sources = Vec::new();
        for child in node.children().iter().filter(|c| !c.comment && c.tag == "part") {
            let map = match child.attr("map") {
                Some(map) => map.parse::<ByteMap>()?,
                None => ByteMap::full(lanes, crate::bytemap::Direction::Descending),
            };
            if map.lanes() != lanes {
                return Err(Error::InvalidByteMap {
                    map: format!("{map} in a {output}-bit interleave"),
                });
            }
            match self.part(child)? {
                Some(bytes) => sources.push((bytes, map)),
                None => {
                    warn!("Interleave dropped as a part is missing");
                    return Ok(None);
                }
            }
        }

        let sources: Vec<(&[u8], ByteMap)> =
            sources.iter().map(|(bytes, map)| (bytes.as_slice(), *map)).collect();
        interleave(lanes, &sources).map(Some)
    }
}

fn number_attr(node: &DescriptorNode, name: &str) -> Result<Option<usize>> {
    node.attr(name)
        .map(|value| {
            parse_int(value)
                .map(|v| v as usize)
                .ok_or_else(|| Error::InvalidNumber {
                    what: format!("{name} attribute"),
                    value: value.to_string(),
                })
        })
        .transpose()
}

fn apply_patches(rom: &DescriptorNode, data: &mut [u8]) -> Result<()> {
    for patch in rom.children().iter().filter(|c| !c.comment && c.tag == "patch") {
        let offset = number_attr(patch, "offset")?.unwrap_or(0);
        let bytes = parse_hex_bytes(&patch.text)?;
        debug!("Patching {} bytes at 0x{offset:X}", bytes.len());
        for (ii, byte) in bytes.into_iter().enumerate() {
            match data.get_mut(offset + ii) {
                Some(dest) => *dest = byte,
                None => {
                    warn!("Patch at 0x{:X} is beyond the ROM end", offset + ii);
                    break;
                }
            }
        }
    }
    Ok(())
}
