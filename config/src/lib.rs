// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Game records and declarative ROM layout configuration for the MRA
//! generator.
//!
//! A [`GameRecord`] describes one emulated machine as extracted from the
//! game metadata database.  A [`LayoutConfig`] describes, for one core, how
//! the ROM regions of every machine it supports must be laid out in the
//! flat ROM image loaded at boot.

pub mod extract;
pub mod game;
pub mod layout;
pub mod matching;

pub use extract::{
    Extractor, GameFilter, JsonExtractor, MustBeConfig, ParentEntry, ParseConfig, SetnameRename,
    SkipConfig,
};
pub use game::{DeviceRef, DipCondition, DipSwitch, DipValue, GameRecord, RomPart, RomStatus};
pub use layout::{
    BANK_MACROS, BlankRule, ButtonNames, ButtonsConfig, CustomDevice, DipConfig, DipRename,
    ExtraDip, Features, Frac, GlobalConfig, HeaderConfig, HeaderData, HeaderDevByte, InfoTag,
    LayoutConfig, MacroValue, OffsetTable, OrderStrategy, Overrule, PatchRule, RbfConfig,
    RbfDev, RbfMachine, RegionRule, ReverseOverrule, RomLayout, SplitRule, ZipConfig,
};
pub use matching::{MachineFilter, MatchTier, best_match, last_match};

use std::collections::BTreeMap;

/// Flat macro table, as produced by the core's macro definitions
pub type Macros = BTreeMap<String, String>;

/// Error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid layout configuration: {error}")]
    InvalidConfig { error: String },

    #[error("invalid game record: {error}")]
    InvalidGame { error: String },

    #[error("ROM region {region} uses undefined macro {name}")]
    UndefinedMacro { region: String, name: String },

    #[error("macro {name} is used as a number, but its value ({value}) is not a number")]
    NotANumber { name: String, value: String },
}

pub type Result<T> = core::result::Result<T, Error>;

/// Parses an integer the way the macro definitions write them: a `0x`, `0b`
/// or `0o` prefix selects the base, otherwise decimal.
pub fn parse_int(s: &str) -> Option<u64> {
    let s = s.trim();
    let (digits, radix) = match s.get(..2).map(str::to_ascii_lowercase).as_deref() {
        Some("0x") => (&s[2..], 16),
        Some("0b") => (&s[2..], 2),
        Some("0o") => (&s[2..], 8),
        _ => (s, 10),
    };
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(&digits.replace('_', ""), radix).ok()
}
