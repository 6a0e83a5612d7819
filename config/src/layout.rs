// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Declarative per-core ROM layout configuration.
//!
//! Model is to load the configuration from JSON together with the core's
//! macro table using [`LayoutConfig::from_json`], which resolves symbolic
//! values once.  The result is then used read-only for every machine.

use std::borrow::Cow;
use std::collections::BTreeMap;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::extract::ParseConfig;
use crate::matching::{MachineFilter, best_match};
use crate::{Error, GameRecord, Macros, Result, parse_int};

/// Macro holding the header length
pub const HEADER_MACRO: &str = "JTFRAME_HEADER";

/// Macro holding the DIP switch base bit
pub const DIPBASE_MACRO: &str = "JTFRAME_MIST_DIPBASE";

/// Macro holding the number of buttons supported by the core
pub const BUTTONS_MACRO: &str = "JTFRAME_BUTTONS";

/// Macro holding the NVRAM size
pub const NVRAM_MACRO: &str = "JTFRAME_IOCTL_RD";

/// Macros marking the start of each SDRAM bank
pub const BANK_MACROS: [&str; 3] = ["JTFRAME_BA1_START", "JTFRAME_BA2_START", "JTFRAME_BA3_START"];

const DEFAULT_DIP_DELETE: [&str; 2] = ["Unused", "Unknown"];

/// Complete layout configuration for one core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "schemars", schemars(title = "MRA Layout Configuration"))]
#[serde(default)]
pub struct LayoutConfig {
    pub global: GlobalConfig,
    pub features: Features,
    pub parse: ParseConfig,
    pub buttons: ButtonsConfig,
    pub dipsw: DipConfig,
    pub rbf: RbfConfig,
    pub header: HeaderConfig,
    pub rom: RomLayout,

    #[serde(skip)]
    macros: Macros,
}

impl LayoutConfig {
    /// Create from a JSON document, resolving symbolic values against the
    /// macro table
    pub fn from_json(json: &str, macros: &Macros) -> Result<Self> {
        let mut config: LayoutConfig =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig {
                error: e.to_string(),
            })?;
        config.resolve(macros)?;
        Ok(config)
    }

    /// Resolve macro references and derived settings.  Called by
    /// [`LayoutConfig::from_json`], and only needs calling directly when the
    /// configuration was built some other way.
    pub fn resolve(&mut self, macros: &Macros) -> Result<()> {
        if let Some(base) = macro_number(macros, DIPBASE_MACRO)? {
            self.dipsw.base = base as usize;
        }

        if self.buttons.core == 0 {
            if let Some(core) = macro_number(macros, BUTTONS_MACRO)? {
                self.buttons.core = core as usize;
            }
        }

        if let Some(len) = macro_number(macros, HEADER_MACRO)? {
            if self.header.len > 0 {
                warn!("header.len in the layout configuration is overridden by {HEADER_MACRO}");
            }
            self.header.len = len as usize;
        }

        if let Some(nvram) = macro_number(macros, NVRAM_MACRO)? {
            self.features.nvram = nvram as usize;
        }

        if self.dipsw.delete.is_empty() {
            self.dipsw.delete = DEFAULT_DIP_DELETE.iter().map(|s| s.to_string()).collect();
        }

        for region in self.rom.regions.iter_mut() {
            region.resolve(macros)?;
        }

        self.macros = macros.clone();
        Ok(())
    }

    /// The macro table this configuration was resolved against
    pub fn macros(&self) -> &Macros {
        &self.macros
    }

    /// Apply the machine-level adjustments the configuration asks for:
    /// region renames and display rotation overrules
    pub fn prepare(&self, mut game: GameRecord) -> GameRecord {
        for overrule in self.global.overrule.iter() {
            if overrule.applies_to(&game) && overrule.rotate != 0 {
                game.display_rotation = overrule.rotate;
            }
        }

        for rule in self.rom.regions.iter().filter(|r| !r.rename.is_empty()) {
            for part in game.rom_parts.iter_mut() {
                if part.region == rule.rename {
                    part.region = rule.name.clone();
                }
            }
        }

        game
    }

    /// Find the rule for a region.  A region without any configured rule
    /// gets a default one.
    pub fn region_rule(&self, region: &str, game: &GameRecord) -> Cow<'_, RegionRule> {
        match best_match(self.rom.regions.iter().filter(|r| r.name == region), game) {
            Some(rule) => Cow::Borrowed(rule),
            None => Cow::Owned(RegionRule::named(region)),
        }
    }

    /// Resolve the rules of several regions at once
    pub fn region_rules<'a, I>(&'a self, regions: I, game: &GameRecord) -> BTreeMap<String, Cow<'a, RegionRule>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        regions
            .into_iter()
            .map(|r| (r.as_ref().to_string(), self.region_rule(r.as_ref(), game)))
            .collect()
    }
}

fn macro_number(macros: &Macros, name: &str) -> Result<Option<u64>> {
    match macros.get(name) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => parse_int(value).map(Some).ok_or_else(|| Error::NotANumber {
            name: name.to_string(),
            value: value.clone(),
        }),
    }
}

/// A numeric value that may be given literally or as the name of a macro
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(untagged)]
pub enum MacroValue {
    Number(u64),
    Text(String),
}

impl MacroValue {
    /// Resolve to a number.  Text is first tried as a number literal, then
    /// looked up as a macro name.
    pub fn resolve(&self, region: &str, macros: &Macros) -> Result<u64> {
        match self {
            MacroValue::Number(n) => Ok(*n),
            MacroValue::Text(text) => {
                if let Some(n) = parse_int(text) {
                    return Ok(n);
                }
                let value = macros.get(text).ok_or_else(|| Error::UndefinedMacro {
                    region: region.to_string(),
                    name: text.clone(),
                })?;
                parse_int(value).ok_or_else(|| Error::NotANumber {
                    name: text.clone(),
                    value: value.clone(),
                })
            }
        }
    }
}

/// Settings that apply to the whole core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct GlobalConfig {
    /// Attributes of the `about` node
    pub about: Vec<InfoTag>,

    /// Extra nodes added to every descriptor
    pub info: Vec<InfoTag>,

    pub mraauthor: Vec<String>,

    pub zip: ZipConfig,

    /// Overrides of values found in the game metadata
    pub overrule: Vec<Overrule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct InfoTag {
    pub tag: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct ZipConfig {
    /// Alternative archive appended to every zip list
    pub alt: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct Overrule {
    pub machine: String,
    pub setname: String,
    pub rotate: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct Features {
    /// NVRAM size in bytes, 0 for none
    pub nvram: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct ButtonsConfig {
    /// Number of buttons the core supports
    pub core: usize,
    pub names: Vec<ButtonNames>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct ButtonNames {
    pub machine: String,
    pub setname: String,
    /// Comma separated button names
    pub names: String,
}

/// DIP switch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct DipConfig {
    /// Switch names hidden from the display list.  They still contribute to
    /// the default value.
    pub delete: Vec<String>,

    /// First bit used by the switches in the core's status word
    pub base: usize,

    /// Total bit count covered by the default value
    pub bitcnt: usize,

    pub extra: Vec<ExtraDip>,
    pub rename: Vec<DipRename>,
}

/// A switch added by the configuration, not present in the game metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct ExtraDip {
    pub machine: String,
    pub setname: String,
    pub name: String,
    pub options: String,
    pub bits: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct DipRename {
    pub name: String,
    /// New name, empty to keep the current one
    pub to: String,
    /// New option labels by position, empty entries are left untouched
    pub values: Vec<String>,
}

/// Core (RBF) name selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct RbfConfig {
    pub name: String,
    pub dev: Vec<RbfDev>,
    pub machines: Vec<RbfMachine>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct RbfDev {
    pub dev: String,
    pub rbf: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct RbfMachine {
    pub machine: String,
    pub setname: String,
    pub rbf: String,
}

/// Header block placed at the start of the ROM image
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct HeaderConfig {
    /// Header length in bytes, 0 for no header
    pub len: usize,

    /// Fill byte
    pub fill: u8,

    /// Optional comment placed before the header
    pub info: String,

    /// Bytes set when the machine uses a device
    pub dev: Vec<HeaderDevByte>,

    /// Manual byte injections
    pub data: Vec<HeaderData>,

    /// Region offset table
    pub offset: OffsetTable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct HeaderDevByte {
    pub byte: usize,
    pub value: u8,
    pub dev: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct HeaderData {
    pub machine: String,
    pub setname: String,
    /// Only applies if the machine uses this device
    pub dev: String,
    #[serde(alias = "pointer")]
    pub offset: usize,
    /// Whitespace separated hex bytes
    pub data: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct OffsetTable {
    /// Right shift applied to each offset
    pub bits: u32,
    /// Store offsets little-endian
    pub reverse: bool,
    /// Header position of the first entry
    pub start: usize,
    pub regions: Vec<String>,
}

/// ROM section of the configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct RomLayout {
    pub regions: Vec<RegionRule>,

    /// Region output order.  Regions not listed are appended in the order
    /// they appear in the game record.
    pub order: Vec<String>,

    /// File names dropped from every region
    pub remove: Vec<String>,

    pub splits: Vec<SplitRule>,
    pub blanks: Vec<BlankRule>,
    pub patches: Vec<PatchRule>,

    /// The ROM is loaded through DDR memory
    pub ddr_load: bool,
}

/// Configuration of one named region
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct RegionRule {
    pub name: String,

    /// Region name in the game metadata to be renamed as `name`
    pub rename: String,

    pub machine: String,
    pub setname: String,

    /// Absolute offset where the region starts
    pub start: Option<MacroValue>,

    /// Data bus width in bits: 8, 16 or 32
    pub width: Option<MacroValue>,

    /// The region is padded up to this length
    #[serde(alias = "len")]
    pub length: usize,

    /// Each file is padded up to this length
    pub rom_len: usize,

    pub reverse: bool,

    /// Limits `reverse` to these widths
    pub reverse_only: Vec<u32>,

    /// Per-file reverse overrides
    pub overrules: Vec<ReverseOverrule>,

    pub skip: bool,
    pub no_offset: bool,

    /// Each file is interleaved with itself
    pub singleton: bool,

    pub sort_byext: bool,
    /// Sort comparing number sections
    pub sort: bool,
    /// Sort with plain alphabetical comparison
    pub sort_alpha: bool,
    /// Even position files first, then odd ones
    pub sort_even: bool,
    pub sort_reverse: bool,

    pub ext_sort: Vec<String>,
    pub name_sort: Vec<String>,
    pub regex_sort: Vec<String>,

    /// File sequence by position, files may be repeated or omitted
    pub sequence: Vec<usize>,

    pub frac: Frac,
    pub custom: CustomDevice,

    /// Replaces the region's files in the game record
    pub files: Vec<crate::RomPart>,

    #[serde(skip)]
    start_offset: Option<usize>,
    #[serde(skip)]
    width_bits: u32,
}

impl RegionRule {
    /// Default rule for a region with no configuration
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn resolve(&mut self, macros: &Macros) -> Result<()> {
        self.start_offset = match &self.start {
            Some(start) => Some(start.resolve(&self.name, macros)? as usize),
            None => None,
        };
        self.width_bits = match &self.width {
            Some(width) => width.resolve(&self.name, macros)? as u32,
            None => 0,
        };

        // Reordering files makes the declared offsets meaningless
        if self.sort_byext
            || self.sort
            || self.sort_alpha
            || self.sort_even
            || self.sort_reverse
            || self.singleton
            || !self.ext_sort.is_empty()
            || !self.name_sort.is_empty()
            || !self.regex_sort.is_empty()
            || !self.sequence.is_empty()
        {
            self.no_offset = true;
        }
        Ok(())
    }

    /// Resolved absolute start offset
    pub fn start(&self) -> Option<usize> {
        self.start_offset
    }

    /// Resolved bus width in bits, 0 if unspecified
    pub fn width(&self) -> u32 {
        self.width_bits
    }

    /// Builder-style override of the resolved start, for rules created in
    /// code
    pub fn with_start(mut self, start: usize) -> Self {
        self.start = Some(MacroValue::Number(start as u64));
        self.start_offset = Some(start);
        self
    }

    /// Builder-style override of the resolved width
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(MacroValue::Number(width as u64));
        self.width_bits = width;
        self
    }

    /// Select the ordering strategy.  The first configured option wins.
    pub fn order_strategy(&self) -> OrderStrategy<'_> {
        if !self.sequence.is_empty() {
            OrderStrategy::Sequence(&self.sequence)
        } else if !self.ext_sort.is_empty() {
            OrderStrategy::ExtensionList(&self.ext_sort)
        } else if !self.name_sort.is_empty() {
            OrderStrategy::NameList(&self.name_sort)
        } else if !self.regex_sort.is_empty() {
            OrderStrategy::RegexList(&self.regex_sort)
        } else if self.sort_even {
            OrderStrategy::EvenOdd {
                even_first: !self.sort_reverse,
            }
        } else if self.sort_byext {
            OrderStrategy::ByExtension {
                alpha: self.sort_alpha,
                reverse: self.sort_reverse,
            }
        } else if self.sort_alpha || self.sort {
            OrderStrategy::FullSort {
                alpha: self.sort_alpha,
            }
        } else {
            OrderStrategy::Declared
        }
    }

    /// Whether a file is byte-swapped.  Per-file overrides take precedence.
    pub fn reverse_for(&self, name: &str) -> bool {
        self.overrule_for(name).unwrap_or(self.reverse)
    }

    /// Whether a file is byte-swapped when emitted with the given width
    pub fn reverse_for_width(&self, name: &str, width: u32) -> bool {
        if let Some(reverse) = self.overrule_for(name) {
            return reverse;
        }
        let width_ok = self.reverse_only.is_empty() || self.reverse_only.contains(&width);
        self.reverse && width_ok
    }

    fn overrule_for(&self, name: &str) -> Option<bool> {
        self.overrules
            .iter()
            .find(|o| o.names.iter().any(|n| n == name))
            .map(|o| o.reverse)
    }
}

/// How the files of a region are reordered before emission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStrategy<'a> {
    /// Order of the game record
    Declared,
    /// Explicit positions.  Positions past the end select the first file.
    Sequence(&'a [usize]),
    /// Files ending in each extension, in list order
    ExtensionList(&'a [String]),
    /// Files with each name, in list order
    NameList(&'a [String]),
    /// Files matching each regular expression, in list order
    RegexList(&'a [String]),
    /// Files at even positions, then files at odd positions
    EvenOdd { even_first: bool },
    /// By file extension, or by name when all extensions are equal
    ByExtension { alpha: bool, reverse: bool },
    /// By full file name
    FullSort { alpha: bool },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct ReverseOverrule {
    pub names: Vec<String>,
    pub reverse: bool,
}

/// Fractional interleave: each file provides `bytes` bytes out of every
/// `parts`-file group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct Frac {
    pub bytes: usize,
    pub parts: usize,
}

/// Generator for regions without a known dump
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct CustomDevice {
    pub dev: String,
}

/// Forces a mid-region break at `offset`, each chunk being at least
/// `min_len` long
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct SplitRule {
    pub machine: String,
    pub setname: String,
    pub region: String,
    /// The setname must contain this text
    pub namehas: String,
    pub offset: usize,
    pub min_len: usize,
}

impl SplitRule {
    pub fn applies(&self, region: &str, game: &GameRecord) -> bool {
        (self.region.is_empty() || self.region == region)
            && (self.machine.is_empty() || game.is_family(&self.machine))
            && (self.setname.is_empty() || self.setname == game.name)
            && (self.namehas.is_empty() || game.name.contains(&self.namehas))
    }
}

/// Inserts `len` blank bytes when the region position reaches `offset`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct BlankRule {
    pub machine: String,
    pub setname: String,
    pub region: String,
    pub offset: usize,
    pub len: usize,
}

/// Overwrites bytes of the final image
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct PatchRule {
    pub machine: String,
    pub setname: String,
    pub offset: usize,
    /// Whitespace separated hex bytes
    pub value: String,
}

macro_rules! machine_filter {
    ($($t:ty),*) => {
        $(impl MachineFilter for $t {
            fn machine(&self) -> &str {
                &self.machine
            }
            fn setname(&self) -> &str {
                &self.setname
            }
        })*
    };
}

machine_filter!(
    RegionRule,
    BlankRule,
    PatchRule,
    HeaderData,
    ExtraDip,
    ButtonNames,
    RbfMachine,
    Overrule
);
