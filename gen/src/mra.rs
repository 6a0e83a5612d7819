// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Assembly of a complete `misterromdescription` descriptor.

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use mra_config::{GameRecord, InfoTag, LayoutConfig, MatchTier, MachineFilter, best_match};

use crate::Result;
use crate::descriptor::DescriptorNode;
use crate::dipsw::encode_switches;
use crate::firmware::FirmwareAssembler;
use crate::layout::compile_rom_section;

/// Buttons used when nothing else is configured
pub const DEFAULT_BUTTONS: &str = "button 1,button 2";

/// Buttons used when the configured list is empty
pub const FALLBACK_BUTTONS: &str = "Shot,Jump";

/// Maximum number of game buttons the frontend supports
pub const MAX_BUTTONS: usize = 6;

const BUTTON_PAD: &str = "Y,X,B,A,R,L,";

/// Settings that come from the command line rather than the core's
/// configuration
#[derive(Debug, Clone, Default)]
pub struct DescriptorOptions {
    pub mame_version: String,
    /// Added to the configured info tags
    pub extra_info: Vec<InfoTag>,
    /// Overrides the configured button names
    pub buttons: Option<String>,
}

/// A complete descriptor
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub root: DescriptorNode,
    /// Default DIP switch bytes, comma separated hex
    pub default_dipsw: String,
    /// Size of the ROM image including any header, 0 if the machine has
    /// no ROMs
    pub rom_size: usize,
}

/// Builds the descriptor of a machine.  The game should already have been
/// passed through [`LayoutConfig::prepare`].
pub fn make_descriptor(
    game: &GameRecord,
    cfg: &LayoutConfig,
    opts: &DescriptorOptions,
    firmware: &dyn FirmwareAssembler,
) -> Result<Descriptor> {
    let mut root = DescriptorNode::new("misterromdescription");

    let about = root.add_node("about");
    for tag in cfg.global.about.iter() {
        about.add_attr(tag.tag.as_str(), tag.value.as_str());
    }
    root.add_text_node("name", cfg.parse.display_name(game));
    root.add_text_node("setname", game.name.as_str());
    root.add_text_node("rbf", rbf_name(game, cfg));
    if !opts.mame_version.is_empty() {
        root.add_text_node("mameversion", opts.mame_version.as_str());
    }
    root.add_text_node("year", game.year.as_str());
    root.add_text_node("manufacturer", game.manufacturer.as_str());
    root.add_text_node("players", game.player_count.to_string());
    if !game.control_ways.is_empty() {
        root.add_text_node("joystick", game.control_ways.as_str());
    }
    root.add_text_node("rotation", rotation(game.display_rotation));
    root.add_text_node("region", guess_region(&game.description));

    let mut info: Vec<&InfoTag> = cfg.global.info.iter().chain(opts.extra_info.iter()).collect();
    info.sort_by_key(|t| t.tag.chars().next());
    for tag in info {
        root.add_text_node(tag.tag.as_str(), tag.value.as_str());
    }
    if !cfg.global.mraauthor.is_empty() {
        root.add_text_node("mraauthor", cfg.global.mraauthor.join(","));
    }

    let rom_size = match compile_rom_section(game, cfg, firmware)? {
        Some(section) => {
            root.push(section.node);
            cfg.header.len + section.size
        }
        None => {
            warn!("{} has no ROM files", game.name);
            0
        }
    };

    if cfg.features.nvram != 0 {
        root.add_node("nvram")
            .add_attr("index", "2")
            .add_int_attr("size", cfg.features.nvram);
    }
    add_coremod(&mut root, game);

    let switches = encode_switches(game, cfg);
    if let Some(node) = switches.node {
        root.push(node);
    }
    add_buttons(&mut root, game, cfg, opts);

    Ok(Descriptor {
        root,
        default_dipsw: switches.default,
        rom_size,
    })
}

/// Core RBF file.  Device rules are overridden by machine family rules,
/// which are overridden by setname rules.
pub fn rbf_name(game: &GameRecord, cfg: &LayoutConfig) -> String {
    let mut name = cfg.rbf.name.as_str();
    if let Some(dev) = cfg.rbf.dev.iter().find(|d| game.has_device(&d.dev)) {
        name = dev.rbf.as_str();
    }
    let machines = cfg.rbf.machines.iter().filter(|m| m.tier(game) > MatchTier::Wildcard);
    if let Some(rule) = best_match(machines, game) {
        name = rule.rbf.as_str();
    }
    if name.is_empty() {
        warn!("No RBF name defined for {}", game.name);
    }
    name.to_string()
}

fn rotation(degrees: u16) -> &'static str {
    match degrees {
        90 => "vertical (cw)",
        270 => "vertical (ccw)",
        _ => "horizontal",
    }
}

/// Region of the world, guessed from the parenthesised part of a
/// description
pub fn guess_region(description: &str) -> &'static str {
    const REGIONS: [(&str, &str); 8] = [
        ("world", "World"),
        ("japan", "Japan"),
        ("euro", "Europe"),
        ("asia", "Asia"),
        ("korea", "Korea"),
        ("taiwan", "Taiwan"),
        ("hispanic", "Hispanic"),
        ("brazil", "Brazil"),
    ];

    let Some(inner) = description
        .split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(inner, _)| inner.to_lowercase())
    else {
        return "World";
    };
    REGIONS
        .iter()
        .find(|(key, _)| inner.contains(key))
        .map(|(_, region)| *region)
        .unwrap_or("World")
}

// Core-mod byte: bit 0 set for vertical games, bit 2 set unless rotated
// clockwise
fn add_coremod(root: &mut DescriptorNode, game: &GameRecord) {
    let mut coremod = 0u8;
    if game.display_rotation != 0 {
        root.add_comment("Vertical game");
        coremod |= 1;
        if game.display_rotation != 90 {
            coremod |= 4;
        }
    }
    root.add_node("rom")
        .add_attr("index", "1")
        .add_text_node("part", format!("{coremod:02X}"));
}

fn add_buttons(root: &mut DescriptorNode, game: &GameRecord, cfg: &LayoutConfig, opts: &DescriptorOptions) {
    let configured = best_match(cfg.buttons.names.iter(), game).map(|b| b.names.as_str());
    let names = match (&opts.buttons, configured) {
        (Some(names), _) => names.as_str(),
        (None, Some(names)) => names,
        (None, None) => DEFAULT_BUTTONS,
    };
    let names = if names.is_empty() { FALLBACK_BUTTONS } else { names };

    let core = cfg.buttons.core;
    let mut list = String::new();
    let mut count = 0;
    let buttons: Vec<&str> = names.split(',').collect();
    for button in buttons.iter().take(core) {
        if *button != "-" {
            if count == MAX_BUTTONS {
                warn!("{}: cannot support more than {MAX_BUTTONS} buttons", game.name);
                break;
            }
            count += 1;
        }
        list.push_str(button);
        list.push(',');
    }
    for _ in buttons.len()..core.min(MAX_BUTTONS) {
        list.push_str("-,");
    }
    list.push_str("Start,Coin,Core credits");

    let pad = &BUTTON_PAD[..core.min(MAX_BUTTONS) * 2];
    root.add_node("buttons")
        .add_attr("names", list)
        .add_attr("default", format!("{pad}Start,Select,-"))
        .add_int_attr("count", count);
}
