// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! ROM region layout compiler.
//!
//! Walks the regions of a machine in the configured order and emits the
//! `rom` node of its descriptor, tracking the position in the output image
//! with a [`Cursor`].  Each region is emitted with exactly one strategy:
//!
//! - singleton: every file is interleaved with itself
//! - multi-width interleave: 16 or 32-bit regions with several files
//! - fractional interleave: each file provides part of every output word
//! - straight dump: files are concatenated
//!
//! Gaps are filled with `FF` parts so every region starts where the core
//! expects it.

use std::collections::BTreeMap;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use mra_config::{
    BANK_MACROS, GameRecord, LayoutConfig, MachineFilter, RegionRule, RomPart, SplitRule,
    last_match, parse_int,
};

use crate::bytemap::{ByteMap, Direction};
use crate::descriptor::{DescriptorNode, hexdump};
use crate::devrom::add_device_roms;
use crate::firmware::FirmwareAssembler;
use crate::header::build_header;
use crate::order::apply_order;
use crate::{Error, Result};

/// Load address used when the ROM goes through DDR memory
pub const DDR_ADDRESS: &str = "0x30000000";

/// The only custom device supported
pub const I8751_DEVICE: &str = "i8751";

/// Next unwritten byte of the output image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor(usize);

impl Cursor {
    pub fn at(pos: usize) -> Self {
        Self(pos)
    }

    pub fn pos(&self) -> usize {
        self.0
    }

    pub fn advance(&mut self, len: usize) {
        self.0 += len;
    }

    /// Emits a fill part up to `target`.  Returns the distance to the
    /// target, negative if the cursor is already past it.  The cursor never
    /// moves backwards, and a target of 0 is ignored.
    pub fn fill_upto(&mut self, target: usize, parent: &mut DescriptorNode) -> i64 {
        if target == 0 {
            return 0;
        }
        let delta = target as i64 - self.0 as i64;
        if delta > 0 {
            parent
                .add_text_node("part", " FF")
                .add_attr("repeat", hex(delta as usize));
            self.0 = target;
        }
        delta
    }
}

/// The compiled `rom` node of a machine
#[derive(Debug, Clone)]
pub struct RomSection {
    pub node: DescriptorNode,
    /// Final cursor position, excluding the header
    pub size: usize,
    /// Start offset of every dumped region
    pub region_offsets: BTreeMap<String, usize>,
}

/// Compiles the ROM section of a machine's descriptor.  Returns `None` for
/// machines without ROM files.
pub fn compile_rom_section(
    game: &GameRecord,
    cfg: &LayoutConfig,
    firmware: &dyn FirmwareAssembler,
) -> Result<Option<RomSection>> {
    if game.rom_parts.is_empty() {
        return Ok(None);
    }
    debug!("Compiling ROM section of {}", game.name);

    let mut rom = DescriptorNode::new("rom");
    rom.add_attr("index", "0")
        .add_attr("zip", zip_list(game, cfg))
        .add_attr("md5", "None");
    if cfg.rom.ddr_load {
        rom.add_attr("address", DDR_ADDRESS);
    }

    let regions = region_order(game, cfg);
    let rules = cfg.region_rules(regions.iter().map(|(name, _)| name), game);

    let header_index = if cfg.header.len > 0 {
        if !cfg.header.info.is_empty() {
            rom.add_comment(cfg.header.info.as_str());
        }
        let mut part = DescriptorNode::new("part");
        part.indent_text = true;
        Some(rom.push(part))
    } else {
        None
    };

    let mut cursor = Cursor::default();
    let mut region_offsets = BTreeMap::new();
    let mut boundary: Option<Boundary> = None;

    for (name, listed) in regions.iter() {
        let Some(rule) = rules.get(name) else {
            continue;
        };
        if rule.skip {
            debug!("Skipping region {name}");
            continue;
        }
        if !listed {
            warn!("Unlisted region for sorting {name} in {}", game.name);
        }

        let parts = extract_region(rule, game, &cfg.rom.remove);
        let nodump = parts.iter().any(RomPart::is_nodump);
        let unchecked = parts
            .iter()
            .find(|p| !p.is_nodump() && p.checksum32.is_none());

        if let Some(start) = rule.start() {
            let delta = cursor.fill_upto(start, &mut rom);
            if delta < 0 {
                warn!(
                    "Start offset overcome by 0x{:X} while parsing region {name} in {}",
                    -delta, game.name
                );
            }
        }
        add_bank_comments(&mut rom, cursor.pos(), cfg);
        annotate_length(&mut rom, boundary.take(), cursor.pos());
        boundary = Some(Boundary {
            index: rom.add_comment(format!("{name} - starts at 0x{:X}", cursor.pos())),
            pos: cursor.pos(),
        });
        let start_pos = cursor.pos();

        let region = Region {
            game,
            cfg,
            rule,
            split: find_split(cfg, name, game),
        };

        if nodump {
            if !add_custom(&region, &mut rom, &mut cursor, firmware)? {
                warn!(
                    "Skipping region {name} of {} because there is no dump known",
                    game.name
                );
                rom.add_comment(format!(
                    "Skipping region {name} because there is no dump known"
                ));
            }
        } else if let Some(part) = unchecked {
            warn!(
                "Skipping region {name} of {} because {} has no checksum known",
                game.name, part.name
            );
            rom.add_comment(format!(
                "Skipping region {name} because {} has no checksum known",
                part.name
            ));
        } else {
            region_offsets.insert(name.clone(), start_pos);
            let parts = apply_order(rule, parts, &game.name)?;
            region.emit(&parts, &mut rom, &mut cursor)?;
        }

        if rule.length > 0 {
            cursor.fill_upto(start_pos + rule.length, &mut rom);
        }
    }
    annotate_length(&mut rom, boundary.take(), cursor.pos());

    add_device_roms(&mut rom, game, cfg, &mut cursor);
    rom.add_comment(format!(
        "Total 0x{:X} bytes - {} kBytes",
        cursor.pos(),
        cursor.pos() >> 10
    ));
    add_patches(&mut rom, game, cfg);

    if let Some(index) = header_index {
        let header = build_header(&cfg.header, &region_offsets, game)?;
        rom.child_or_self(Some(index)).set_text(hexdump(&header, 8));
    }

    Ok(Some(RomSection {
        node: rom,
        size: cursor.pos(),
        region_offsets,
    }))
}

/// Archives holding the machine's files, in lookup order
pub fn zip_list(game: &GameRecord, cfg: &LayoutConfig) -> String {
    let mut zips = vec![format!("{}.zip", game.name)];
    if !game.clone_of.is_empty() {
        zips.push(format!("{}.zip", game.clone_of));
    }
    if !cfg.global.zip.alt.is_empty() {
        zips.push(cfg.global.zip.alt.clone());
    }
    zips.join("|")
}

/// Configured regions first, then any others in the order the machine
/// declares them.  The flag is false for the latter.
fn region_order(game: &GameRecord, cfg: &LayoutConfig) -> Vec<(String, bool)> {
    let mut regions: Vec<(String, bool)> =
        cfg.rom.order.iter().map(|r| (r.clone(), true)).collect();
    for part in game.rom_parts.iter() {
        if !regions.iter().any(|(name, _)| *name == part.region) {
            regions.push((part.region.clone(), false));
        }
    }
    regions
}

/// Files of a region.  Files listed in the rule replace the machine's own.
pub fn extract_region(rule: &RegionRule, game: &GameRecord, remove: &[String]) -> Vec<RomPart> {
    if !rule.files.is_empty() {
        return rule
            .files
            .iter()
            .map(|f| RomPart {
                region: rule.name.clone(),
                ..f.clone()
            })
            .collect();
    }
    game.rom_parts
        .iter()
        .filter(|p| p.region == rule.name && !remove.contains(&p.name))
        .cloned()
        .collect()
}

fn find_split<'a>(cfg: &'a LayoutConfig, region: &str, game: &GameRecord) -> Option<&'a SplitRule> {
    cfg.rom.splits.iter().filter(|s| s.applies(region, game)).last()
}

fn add_bank_comments(rom: &mut DescriptorNode, pos: usize, cfg: &LayoutConfig) {
    for name in BANK_MACROS {
        let start = cfg
            .macros()
            .get(name)
            .and_then(|v| parse_int(v))
            .unwrap_or(0);
        if start != 0 && start as usize == pos {
            rom.add_comment(name);
        }
    }
}

fn add_patches(rom: &mut DescriptorNode, game: &GameRecord, cfg: &LayoutConfig) {
    for patch in cfg.rom.patches.iter().filter(|p| p.applies_to(game)) {
        rom.add_text_node("patch", patch.value.as_str())
            .add_attr("offset", hex(patch.offset));
    }
}

fn hex(value: usize) -> String {
    format!("0x{value:X}")
}

// Comment marking the start of a region, annotated with the region length
// once the next region starts
struct Boundary {
    index: usize,
    pos: usize,
}

fn annotate_length(rom: &mut DescriptorNode, boundary: Option<Boundary>, pos: usize) {
    let Some(boundary) = boundary else {
        return;
    };
    let len = pos.saturating_sub(boundary.pos);
    if len == 0 {
        return;
    }
    if let Some(node) = rom.child_mut(boundary.index) {
        let bits = usize::BITS - (len - 1).leading_zeros();
        node.tag = format!("{} - length 0x{len:X} ({bits} bits)", node.tag);
    }
}

fn add_custom(
    region: &Region<'_>,
    rom: &mut DescriptorNode,
    cursor: &mut Cursor,
    firmware: &dyn FirmwareAssembler,
) -> Result<bool> {
    let dev = &region.rule.custom.dev;
    if dev.is_empty() {
        return Ok(false);
    }
    if dev != I8751_DEVICE {
        return Err(Error::UnsupportedCustomDevice {
            region: region.rule.name.clone(),
            dev: dev.clone(),
        });
    }

    let Some(bin) = firmware.assemble(region.game) else {
        return Ok(false);
    };
    rom.add_comment("Using custom firmware (no known dump)");
    rom.add_text_node("part", hexdump(&bin, 16)).indent_text = true;
    cursor.advance(bin.len());
    Ok(true)
}

fn add_part<'n>(parent: &'n mut DescriptorNode, part: &RomPart) -> &'n mut DescriptorNode {
    let node = parent.add_node("part");
    node.add_attr("name", part.name.as_str());
    if let Some(crc) = part.crc_str() {
        node.add_attr("crc", crc);
    }
    node
}

fn push_interleave(rom: &mut DescriptorNode, width: usize) -> usize {
    let mut node = DescriptorNode::new("interleave");
    node.add_int_attr("output", width);
    rom.push(node)
}

// A part wrapped, if reversed, in a byte swapping 16-bit interleave
fn add_straight_part<'n>(
    rom: &'n mut DescriptorNode,
    part: &RomPart,
    reverse: bool,
) -> &'n mut DescriptorNode {
    if !reverse {
        return add_part(rom, part);
    }
    let index = push_interleave(rom, 16);
    let node = add_part(rom.child_or_self(Some(index)), part);
    node.add_attr("map", ByteMap::full(2, Direction::Ascending).to_string());
    node
}

/// A file and the interleave group it belongs to
#[derive(Debug, Clone, Copy)]
struct Grouped<'p> {
    part: &'p RomPart,
    /// 0 for files not interleaved
    group: usize,
    /// Bytes provided per output word
    word_width: usize,
}

struct Region<'a> {
    game: &'a GameRecord,
    cfg: &'a LayoutConfig,
    rule: &'a RegionRule,
    split: Option<&'a SplitRule>,
}

impl Region<'_> {
    fn emit(&self, parts: &[RomPart], rom: &mut DescriptorNode, cursor: &mut Cursor) -> Result<()> {
        let width = self.rule.width();
        if self.rule.singleton {
            self.emit_singleton(parts, rom, cursor)
        } else if matches!(width, 16 | 32) && parts.len() > 1 {
            self.emit_interleave(parts, rom, cursor)
        } else if self.rule.frac.parts != 0 {
            self.emit_frac(parts, rom, cursor)
        } else if width <= 8 || parts.len() <= 1 {
            self.emit_straight(parts, rom, cursor);
            Ok(())
        } else {
            Err(self.unsupported_width())
        }
    }

    fn unsupported_width(&self) -> Error {
        Error::UnsupportedWidth {
            machine: self.game.name.clone(),
            region: self.rule.name.clone(),
            width: self.rule.width(),
        }
    }

    fn uneven(&self, parts: &[&RomPart]) -> Error {
        Error::UnevenInterleave {
            machine: self.game.name.clone(),
            region: self.rule.name.clone(),
            width: self.rule.width(),
            files: parts
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    fn byte_map(&self, word_width: usize, output_bytes: usize, step: usize, reverse: bool) -> Result<ByteMap> {
        ByteMap::build(word_width, output_bytes, step, reverse).ok_or_else(|| Error::InvalidByteMap {
            map: format!(
                "{word_width} byte word {step} in a {output_bytes} byte output for region {}",
                self.rule.name
            ),
        })
    }

    // Inserts the configured blank when the region position reaches it
    fn insert_blank(&self, rom: &mut DescriptorNode, cursor: &mut Cursor, start_pos: usize) {
        let blanks = self
            .cfg
            .rom
            .blanks
            .iter()
            .filter(|b| b.region.is_empty() || b.region == self.rule.name);
        let Some(blank) = last_match(blanks, self.game) else {
            return;
        };
        if blank.offset == 0 || blank.offset != cursor.pos() - start_pos || blank.len == 0 {
            return;
        }
        cursor.fill_upto(cursor.pos() + blank.len, rom);
        rom.add_comment(format!("Blank ends at 0x{:X}", cursor.pos()));
    }

    fn emit_straight(&self, parts: &[RomPart], rom: &mut DescriptorNode, cursor: &mut Cursor) {
        let rule = self.rule;
        let start_pos = cursor.pos();

        for part in parts {
            if !rule.no_offset {
                let target = start_pos + (part.declared_offset & !1);
                if cursor.fill_upto(target, rom) < 0 {
                    warn!(
                        "ROM start overcome at 0x{:X} (expected 0x{target:X}) while parsing region {} ({})",
                        cursor.pos(),
                        rule.name,
                        self.game.name
                    );
                }
            }
            let rom_pos = cursor.pos();
            let reverse = rule.reverse_for(&part.name);

            let rel = cursor.pos() - start_pos;
            let split = self.split.filter(|s| {
                rel <= s.offset && rel + part.size > s.offset && s.min_len > part.size / 2
            });

            match split {
                Some(split) => {
                    debug!("Split {} at 0x{:X}", part.name, split.offset);
                    let half = part.size / 2;
                    add_straight_part(rom, part, reverse).add_attr("length", hex(half));
                    cursor.advance(half);
                    cursor.fill_upto(cursor.pos() + split.min_len - half, rom);
                    add_straight_part(rom, part, reverse)
                        .add_attr("length", hex(half))
                        .add_attr("offset", hex(half));
                    cursor.advance(half);
                }
                None => {
                    let node = add_straight_part(rom, part, reverse);
                    if rule.rom_len != 0 {
                        node.add_attr("length", hex(rule.rom_len));
                        cursor.advance(part.size.min(rule.rom_len));
                    } else {
                        cursor.advance(part.size);
                    }
                }
            }

            if rule.rom_len > part.size {
                cursor.fill_upto(rom_pos + rule.rom_len, rom);
            }
            self.insert_blank(rom, cursor, start_pos);
        }
    }

    /// Works out the interleave groups from the declared offsets.  Files in
    /// the same 16-byte block form a group, and the lowest offset bits give
    /// the word width.  Without offsets all files are one group of bytes.
    fn group_parts<'p>(&self, parts: &'p [RomPart]) -> Result<Vec<Grouped<'p>>> {
        let width_bytes = self.rule.width() as usize / 8;
        let mut grouped: Vec<Grouped<'p>> = parts
            .iter()
            .map(|part| Grouped {
                part,
                group: 0,
                word_width: 0,
            })
            .collect();

        if self.rule.no_offset {
            if parts.len() % width_bytes != 0 {
                return Err(self.uneven(&parts.iter().collect::<Vec<_>>()));
            }
            for g in grouped.iter_mut() {
                g.group = 1;
                g.word_width = 1;
            }
            return Ok(grouped);
        }

        let mut group_cnt = 0;
        let mut first = 0;
        while first < grouped.len() {
            let block = grouped[first].part.declared_offset & !0xf;
            let mut last = first;
            let mut word_width = 8;
            for (jj, g) in grouped.iter().enumerate().skip(first) {
                let offset = g.part.declared_offset;
                if offset & !0xf != block {
                    break;
                }
                if offset & 1 != 0 {
                    word_width = 1;
                }
                if word_width > 1 && offset & 2 != 0 {
                    word_width = 2;
                }
                if word_width > 2 && offset & 4 != 0 {
                    word_width = 4;
                }
                last = jj;
            }

            if last != first {
                group_cnt += 1;
                if (last - first + 1) * word_width != width_bytes {
                    let files: Vec<_> = grouped[first..=last].iter().map(|g| g.part).collect();
                    return Err(self.uneven(&files));
                }
                debug!("Group found ({first}-{last}), {word_width} byte words");
                for g in grouped[first..=last].iter_mut() {
                    g.group = group_cnt;
                    g.word_width = word_width;
                }
            }
            group_cnt += last - first + 1;
            first = last + 1;
        }
        Ok(grouped)
    }

    fn emit_interleave(&self, parts: &[RomPart], rom: &mut DescriptorNode, cursor: &mut Cursor) -> Result<()> {
        let rule = self.rule;
        let width = rule.width() as usize;
        let width_bytes = width / 8;
        let grouped = self.group_parts(parts)?;
        debug!("{width}-bit interleave for {} ({})", rule.name, self.game.name);

        let start_pos = cursor.pos();
        let (split_offset, split_min) = self.split.map(|s| (s.offset, s.min_len)).unwrap_or((0, 0));
        let phases = if split_offset > 0 { 2 } else { 1 };
        let mut deficit = 0;

        for phase in 0..phases {
            if phase == 1 {
                cursor.fill_upto(start_pos + split_offset, rom);
                rom.add_comment(format!(
                    "ROM split at {:X} ({:X})",
                    cursor.pos(),
                    cursor.pos() - start_pos
                ));
            }
            let chunk_start = cursor.pos();

            let mut first = 0;
            while first < grouped.len() {
                let head = grouped[first];
                let mut map = None;
                let mut target = None;
                let mut count = 1;

                if head.group != 0 {
                    if deficit > 0 {
                        cursor.fill_upto(cursor.pos() + deficit, rom);
                    }
                    let offset = if rule.no_offset { 0 } else { head.part.declared_offset };
                    cursor.fill_upto(start_pos + (offset & !1), rom);
                    deficit = 0;
                    target = Some(push_interleave(rom, width));
                    map = Some(self.byte_map(head.word_width, width_bytes, 0, false)?);
                    count = width_bytes / head.word_width;
                }

                let end = first + count;
                if end > grouped.len() {
                    let files: Vec<_> = grouped[first..].iter().map(|g| g.part).collect();
                    return Err(self.uneven(&files));
                }
                let order: Vec<usize> = if rule.reverse {
                    (first..end).rev().collect()
                } else {
                    (first..end).collect()
                };

                for jj in order {
                    let g = grouped[jj];
                    if rule.reverse && g.group == 0 && rule.reverse_for_width(&g.part.name, 16) {
                        map = Some(ByteMap::full(2, Direction::Ascending));
                        target = Some(push_interleave(rom, 16));
                    }

                    let node = add_part(rom.child_or_self(target), g.part);
                    if let Some(m) = map {
                        node.add_attr("map", m.to_string());
                        map = Some(m.rotated());
                    }

                    if split_offset != 0 {
                        let half = g.part.size / 2;
                        node.add_attr("length", hex(half));
                        if phase == 1 {
                            node.add_attr("offset", hex(half));
                        }
                        cursor.advance(half);
                    } else {
                        cursor.advance(g.part.size);
                        if rule.rom_len > g.part.size {
                            deficit += rule.rom_len - g.part.size;
                        }
                    }
                    self.insert_blank(rom, cursor, start_pos);
                }
                first = end;
            }

            if cursor.pos() - chunk_start < split_min {
                cursor.fill_upto(chunk_start + split_min, rom);
            }
        }
        Ok(())
    }

    fn emit_frac(&self, parts: &[RomPart], rom: &mut DescriptorNode, cursor: &mut Cursor) -> Result<()> {
        let rule = self.rule;
        let (bytes, group) = (rule.frac.bytes, rule.frac.parts);
        if bytes == 0 || group % bytes != 0 {
            return Err(Error::InvalidFraction {
                region: rule.name.clone(),
                bytes,
                parts: group,
            });
        }
        let output_bytes = group / bytes;
        if output_bytes % 2 != 0 {
            return Err(Error::FracOutputNotEven {
                region: rule.name.clone(),
                output_bytes,
            });
        }

        let files = pad_frac(parts, group);
        let groups = files.len() / group;
        let frac_start = cursor.pos();
        let mut target = None;

        for (kk, part) in files.iter().enumerate() {
            let (cohort, step) = (kk / group, kk % group);
            if step == 0 {
                if kk != 0 && (rule.rom_len != 0 || rule.length != 0) {
                    let expected = (rule.rom_len * group).max(rule.length / groups);
                    cursor.fill_upto(frac_start + expected * cohort, rom);
                }
                target = Some(push_interleave(rom, output_bytes * 8));
            }
            let map = self.byte_map(bytes, output_bytes, step, rule.reverse)?;
            add_part(rom.child_or_self(target), part).add_attr("map", map.to_string());
            cursor.advance(part.size);
        }
        Ok(())
    }

    fn emit_singleton(&self, parts: &[RomPart], rom: &mut DescriptorNode, cursor: &mut Cursor) -> Result<()> {
        let width = self.rule.width() as usize;
        if width != 16 && width != 32 {
            return Err(self.unsupported_width());
        }
        rom.add_comment("Singleton region. The files are merged with themselves.");

        let divider = width / 8;
        for part in parts {
            let index = push_interleave(rom, width);
            let chunk = part.size / divider;
            for kk in 0..divider {
                let map = self.byte_map(1, divider, kk, self.rule.reverse)?;
                add_part(rom.child_or_self(Some(index)), part)
                    .add_attr("offset", format!("0x{:04x}", chunk * kk))
                    .add_attr("map", map.to_string())
                    .add_attr("length", format!("0x{chunk:04X}"));
            }
            cursor.advance(part.size);
        }
        Ok(())
    }
}

/// Pads the file list to a whole number of cohorts by repeating files.
/// When the missing count divides the list evenly, a filler follows each
/// slice of the list, otherwise the last file fills the final cohort.
fn pad_frac(parts: &[RomPart], group: usize) -> Vec<&RomPart> {
    let rem = parts.len() % group;
    if rem == 0 {
        return parts.iter().collect();
    }
    let missing = group - rem;

    let mut files = Vec::with_capacity(parts.len() + missing);
    if parts.len() % missing == 0 {
        for slice in parts.chunks(parts.len() / missing) {
            files.extend(slice.iter());
            files.extend(slice.last());
        }
    } else {
        files.extend(parts.iter());
        files.extend(std::iter::repeat_n(&parts[parts.len() - 1], missing));
    }
    files
}
