// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! DIP switch encoder.
//!
//! Converts the DIP switch definitions of a machine into the `switches`
//! node of its descriptor.  Each hardware tag maps to one byte of the
//! default value, and each switch becomes a `dip` node giving its bit range
//! within the packed switch word and its option labels.

use lazy_static::lazy_static;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use mra_config::{DipSwitch, DipValue, GameRecord, LayoutConfig, MachineFilter};
use regex::Regex;

use crate::descriptor::DescriptorNode;

/// Maximum length of a switch name plus one of its options on the OSD
pub const OSD_OPTION_LEN: usize = 26;

/// Default returned for machines without DIP switches
pub const NO_SWITCHES_DEFAULT: &str = "ff,ff";

lazy_static! {
    static ref CLEANUPS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r" Coins?| Credits?").unwrap(), ""),
        (Regex::new(" and every ").unwrap(), " & *"),
        (Regex::new("00000").unwrap(), "00k"),
        (Regex::new("0000").unwrap(), "0k"),
        (Regex::new(r"\([^)]*\)").unwrap(), ""),
        (Regex::new(" +").unwrap(), " "),
        (Regex::new(" ?, ?").unwrap(), ","),
    ];
}

/// The encoded switches of a machine
#[derive(Debug, Clone)]
pub struct SwitchSection {
    /// `None` when the machine has no switches
    pub node: Option<DescriptorNode>,
    /// Comma separated default bytes, in hex
    pub default: String,
}

/// Encodes the DIP switches of a machine
pub fn encode_switches(game: &GameRecord, cfg: &LayoutConfig) -> SwitchSection {
    if game.dip_switches.is_empty() {
        return SwitchSection {
            node: None,
            default: NO_SWITCHES_DEFAULT.to_string(),
        };
    }

    let mut node = DescriptorNode::new("switches");
    node.add_attr("page_id", "1")
        .add_attr("page_name", "Switches")
        .add_int_attr("base", cfg.dipsw.base);

    let mut defaults: Vec<u8> = Vec::new();
    let mut last_tag: Option<&str> = None;
    let mut base = 0;
    let mut def_cur = 0xffu8;

    for declared in game.dip_switches.iter() {
        if declared
            .condition
            .as_ref()
            .is_some_and(|c| !c.tag.is_empty() && c.value == 0)
        {
            debug!("Skipping conditional switch {} in {}", declared.name, game.name);
            continue;
        }
        if declared.mask == 0 {
            warn!("Switch {} in {} has no bits, skipping", declared.name, game.name);
            continue;
        }

        let hidden = cfg.dipsw.delete.contains(&declared.name);
        let ds = renamed(declared, cfg);
        let bit_min = ds.mask.trailing_zeros() as usize;
        let bit_max = (31 - ds.mask.leading_zeros()) as usize;

        if last_tag != Some(declared.tag.as_str()) {
            if last_tag.is_some() {
                defaults.push(def_cur);
                def_cur = 0xff;
                base += 8;
            }
            last_tag = Some(declared.tag.as_str());
            node.add_comment(declared.tag.as_str());
        }

        let mut values = ds.values.clone();
        values.sort_by_key(|v| v.value);

        if !hidden {
            let options = option_labels(&values, bit_min);
            for option in options.split(',') {
                let extra = (ds.name.len() + option.len()).saturating_sub(OSD_OPTION_LEN);
                if extra > 0 {
                    warn!(
                        "DIP option too long for the OSD ({extra} extra): {}:{option}",
                        ds.name
                    );
                }
            }

            let bits = if bit_min == bit_max {
                format!("{}", base + bit_min)
            } else {
                format!("{},{}", base + bit_min, base + bit_max)
            };
            node.add_node("dip")
                .add_attr("name", ds.name.as_str())
                .add_attr("bits", bits)
                .add_attr("ids", options);
        }

        if let Some(default) = values.iter().find(|v| v.default) {
            if ds.mask > 0xff {
                warn!(
                    "Switch {} in {} uses bits above 7 (mask 0x{:X}), their default is lost",
                    ds.name, game.name, ds.mask
                );
            }
            let mask = (ds.mask & 0xff) as u8;
            def_cur = (def_cur & !mask) | ((default.value & 0xff) as u8 & mask);
        }
    }
    if last_tag.is_some() {
        defaults.push(def_cur);
    }

    while defaults.len() * 8 < cfg.dipsw.bitcnt {
        defaults.push(0xff);
    }
    let default = defaults
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(",");
    node.add_attr("default", default.as_str());

    for extra in cfg.dipsw.extra.iter().filter(|e| e.applies_to(game)) {
        node.add_node("dip")
            .add_attr("name", extra.name.as_str())
            .add_attr("ids", extra.options.as_str())
            .add_attr("bits", extra.bits.as_str());
    }

    SwitchSection {
        node: Some(node),
        default,
    }
}

// Applies the configured rename, if any.  Option renames refer to the
// declared order of the options.
fn renamed(ds: &DipSwitch, cfg: &LayoutConfig) -> DipSwitch {
    let mut ds = ds.clone();
    if let Some(rename) = cfg.dipsw.rename.iter().find(|r| r.name == ds.name) {
        if !rename.to.is_empty() {
            ds.name = rename.to.clone();
        }
        for (value, label) in ds.values.iter_mut().zip(rename.values.iter()) {
            if !label.is_empty() {
                value.name = label.clone();
            }
        }
    }
    ds
}

/// Comma separated option labels, in value order.  Unused values in
/// between are shown as `-`.
fn option_labels(values: &[DipValue], bit_min: usize) -> String {
    let mut labels = Vec::with_capacity(values.len());
    let mut next = 0;
    for value in values {
        let index = (value.value >> bit_min) as usize;
        while next < index {
            labels.push("-".to_string());
            next += 1;
        }
        labels.push(value.name.replace(',', " "));
        next += 1;
    }
    shorten(&labels.join(","))
}

/// Strips the verbose parts of option labels
pub fn shorten(options: &str) -> String {
    CLEANUPS
        .iter()
        .fold(options.to_string(), |acc, (re, with)| re.replace_all(&acc, *with).into_owned())
}
