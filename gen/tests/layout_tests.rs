// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Tests for the mra-gen ROM region layout compiler
//!
//! Each test compiles the ROM section of a small machine and checks the
//! emitted nodes.  Where the byte layout matters the section is also
//! materialized from in-memory archives.

#[cfg(test)]
mod tests {
    use mra_config::{GameRecord, LayoutConfig, Macros, RomPart, RomStatus};
    use mra_gen::{
        DescriptorNode, DescriptorOptions, Error, FirmwareAssembler, MemoryArchives, NoFirmware,
        RomSection, compile_rom_section, make_descriptor, materialize,
    };

    // ========================================================================
    // Helpers
    // ========================================================================

    const SETNAME: &str = "testgame";

    fn config(json: &str) -> LayoutConfig {
        LayoutConfig::from_json(json, &Macros::new()).unwrap()
    }

    fn part(name: &str, region: &str, crc: u32, size: usize, offset: usize) -> RomPart {
        RomPart {
            name: name.to_string(),
            region: region.to_string(),
            checksum32: Some(crc),
            size,
            declared_offset: offset,
            ..Default::default()
        }
    }

    fn game(parts: Vec<RomPart>) -> GameRecord {
        GameRecord {
            name: SETNAME.to_string(),
            description: "Test Game (World)".to_string(),
            rom_parts: parts,
            ..Default::default()
        }
    }

    fn compile(game: &GameRecord, cfg: &LayoutConfig) -> RomSection {
        compile_rom_section(game, cfg, &NoFirmware).unwrap().unwrap()
    }

    /// Files backing a machine, added to its archive.  Returns the parts
    /// describing them.
    struct Files {
        archives: MemoryArchives,
    }

    impl Files {
        fn new() -> Self {
            Self {
                archives: MemoryArchives::new(),
            }
        }

        fn add(&mut self, name: &str, region: &str, data: Vec<u8>, offset: usize) -> RomPart {
            let size = data.len();
            let crc = self
                .archives
                .archive(&format!("{SETNAME}.zip"))
                .add(name, data);
            part(name, region, crc, size, offset)
        }

        /// Builds the whole descriptor and materializes it
        fn materialize(&self, game: &GameRecord, cfg: &LayoutConfig) -> (DescriptorNode, Vec<u8>) {
            let mut descriptor =
                make_descriptor(game, cfg, &DescriptorOptions::default(), &NoFirmware).unwrap();
            let image = materialize(&mut descriptor.root, &self.archives).unwrap();
            assert!(image.is_complete(), "missing {:?}", image.missing);
            assert_eq!(image.data.len(), descriptor.rom_size);
            (descriptor.root, image.data)
        }
    }

    fn comments(node: &DescriptorNode) -> Vec<&str> {
        node.children()
            .iter()
            .filter(|c| c.comment)
            .map(|c| c.tag.as_str())
            .collect()
    }

    fn part_names(node: &DescriptorNode) -> Vec<&str> {
        node.children()
            .iter()
            .filter(|c| !c.comment && c.tag == "part")
            .filter_map(|c| c.attr("name"))
            .collect()
    }

    fn interleaves(node: &DescriptorNode) -> Vec<&DescriptorNode> {
        node.children()
            .iter()
            .filter(|c| !c.comment && c.tag == "interleave")
            .collect()
    }

    fn bytes(start: u8, len: usize) -> Vec<u8> {
        (0..len).map(|ii| start.wrapping_add(ii as u8)).collect()
    }

    // ========================================================================
    // ROM node basics
    // ========================================================================

    #[test]
    fn test_no_roms() {
        let cfg = config("{}");
        let section = compile_rom_section(&game(vec![]), &cfg, &NoFirmware).unwrap();
        assert!(section.is_none());
    }

    #[test]
    fn test_rom_attributes() {
        let cfg = config(r#"{ "global": { "zip": { "alt": "jtbeta.zip" } }, "rom": { "ddr_load": true } }"#);
        let mut g = game(vec![part("a.bin", "maincpu", 1, 0x10, 0)]);
        g.clone_of = "parent".to_string();
        let section = compile(&g, &cfg);

        assert_eq!(section.node.tag, "rom");
        assert_eq!(section.node.attr("index"), Some("0"));
        assert_eq!(
            section.node.attr("zip"),
            Some("testgame.zip|parent.zip|jtbeta.zip")
        );
        assert_eq!(section.node.attr("md5"), Some("None"));
        assert_eq!(section.node.attr("address"), Some("0x30000000"));
    }

    #[test]
    fn test_fill_to_region_start() {
        let cfg = config(
            r#"{ "rom": { "order": ["maincpu", "gfx"], "regions": [ { "name": "gfx", "start": 4096 } ] } }"#,
        );
        let g = game(vec![
            part("main.bin", "maincpu", 1, 0xf00, 0),
            part("gfx.bin", "gfx", 2, 0x100, 0),
        ]);
        let section = compile(&g, &cfg);
        let children = section.node.children();

        assert_eq!(part_names(&section.node), vec!["main.bin", "gfx.bin"]);
        let fill = &children[2];
        assert_eq!(fill.tag, "part");
        assert_eq!(fill.text, " FF");
        assert_eq!(fill.attr("repeat"), Some("0x100"));

        assert_eq!(
            comments(&section.node),
            vec![
                "maincpu - starts at 0x0 - length 0x1000 (12 bits)",
                "gfx - starts at 0x1000 - length 0x100 (8 bits)",
                "Total 0x1100 bytes - 4 kBytes",
            ]
        );
        assert_eq!(section.size, 0x1100);
        assert_eq!(section.region_offsets.get("maincpu"), Some(&0));
        assert_eq!(section.region_offsets.get("gfx"), Some(&0x1000));
    }

    #[test]
    fn test_unlisted_regions_follow() {
        let cfg = config(r#"{ "rom": { "order": ["gfx"] } }"#);
        let g = game(vec![
            part("main.bin", "maincpu", 1, 0x10, 0),
            part("gfx.bin", "gfx", 2, 0x10, 0),
        ]);
        let section = compile(&g, &cfg);
        assert_eq!(part_names(&section.node), vec!["gfx.bin", "main.bin"]);
        assert_eq!(section.region_offsets.get("maincpu"), Some(&0x10));
    }

    #[test]
    fn test_skip_and_remove() {
        let cfg = config(
            r#"{ "rom": { "remove": ["bad.bin"], "regions": [ { "name": "plds", "skip": true } ] } }"#,
        );
        let g = game(vec![
            part("main.bin", "maincpu", 1, 0x10, 0),
            part("bad.bin", "maincpu", 2, 0x10, 0x10),
            part("pal.bin", "plds", 3, 0x10, 0),
        ]);
        let section = compile(&g, &cfg);
        assert_eq!(part_names(&section.node), vec!["main.bin"]);
        assert!(!section.region_offsets.contains_key("plds"));
    }

    #[test]
    fn test_sequence_order() {
        let cfg = config(r#"{ "rom": { "regions": [ { "name": "gfx", "sequence": [2, 0, 1] } ] } }"#);
        let g = game(vec![
            part("c0", "gfx", 1, 0x10, 0),
            part("c1", "gfx", 2, 0x10, 0x10),
            part("c2", "gfx", 3, 0x10, 0x20),
        ]);
        let section = compile(&g, &cfg);
        assert_eq!(part_names(&section.node), vec!["c2", "c0", "c1"]);
        assert_eq!(section.size, 0x30);
    }

    #[test]
    fn test_region_length_padding() {
        let cfg = config(r#"{ "rom": { "regions": [ { "name": "maincpu", "length": 4096 } ] } }"#);
        let g = game(vec![part("main.bin", "maincpu", 1, 0x800, 0)]);
        let section = compile(&g, &cfg);
        assert_eq!(section.size, 0x1000);
        assert_eq!(section.node.children()[2].attr("repeat"), Some("0x800"));
    }

    #[test]
    fn test_nodump_region_skipped() {
        let cfg = config("{}");
        let mut mcu = part("mcu.bin", "mcu", 0, 0x1000, 0);
        mcu.checksum32 = None;
        mcu.status = RomStatus::NoDump;
        let g = game(vec![part("main.bin", "maincpu", 1, 0x10, 0), mcu]);
        let section = compile(&g, &cfg);

        assert!(comments(&section.node).contains(&"Skipping region mcu because there is no dump known"));
        assert!(!section.region_offsets.contains_key("mcu"));
        assert_eq!(section.size, 0x10);
    }

    #[test]
    fn test_missing_checksum_skips_region() {
        let cfg = config(r#"{ "rom": { "order": ["maincpu", "gfx"] } }"#);
        let mut gfx = part("gfx.bin", "gfx", 0, 0x10, 0);
        gfx.checksum32 = None;
        let g = game(vec![part("main.bin", "maincpu", 1, 0x10, 0), gfx]);
        let section = compile(&g, &cfg);

        assert_eq!(part_names(&section.node), vec!["main.bin"]);
        assert!(
            comments(&section.node)
                .contains(&"Skipping region gfx because gfx.bin has no checksum known")
        );
        assert!(!section.region_offsets.contains_key("gfx"));
        assert_eq!(section.size, 0x10);
    }

    struct FixedFirmware(Vec<u8>);

    impl FirmwareAssembler for FixedFirmware {
        fn assemble(&self, _game: &GameRecord) -> Option<Vec<u8>> {
            Some(self.0.clone())
        }
    }

    #[test]
    fn test_custom_firmware() {
        let cfg = config(
            r#"{ "rom": { "regions": [ { "name": "mcu", "length": 16, "custom": { "dev": "i8751" } } ] } }"#,
        );
        let mut mcu = part("mcu.bin", "mcu", 0, 0x1000, 0);
        mcu.checksum32 = None;
        mcu.status = RomStatus::NoDump;
        let g = game(vec![mcu]);

        let section = compile_rom_section(&g, &cfg, &FixedFirmware(vec![1, 2, 3]))
            .unwrap()
            .unwrap();
        assert!(comments(&section.node).contains(&"Using custom firmware (no known dump)"));
        let parts: Vec<_> = section
            .node
            .children()
            .iter()
            .filter(|c| !c.comment && c.tag == "part")
            .collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].indent_text);
        assert!(parts[0].text.contains("01 02 03"));
        assert_eq!(parts[1].text, " FF");
        assert_eq!(parts[1].attr("repeat"), Some("0xD"));
        assert_eq!(section.size, 16);
    }

    #[test]
    fn test_unsupported_custom_device() {
        let cfg = config(r#"{ "rom": { "regions": [ { "name": "mcu", "custom": { "dev": "z80" } } ] } }"#);
        let mut mcu = part("mcu.bin", "mcu", 0, 0x1000, 0);
        mcu.status = RomStatus::NoDump;
        let g = game(vec![mcu]);
        assert!(matches!(
            compile_rom_section(&g, &cfg, &NoFirmware),
            Err(Error::UnsupportedCustomDevice { .. })
        ));
    }

    #[test]
    fn test_patches_emitted() {
        let cfg = config(
            r#"{ "rom": { "patches": [
                { "setname": "testgame", "offset": 16, "value": "AA 55" },
                { "setname": "other", "offset": 0, "value": "00" }
            ] } }"#,
        );
        let g = game(vec![part("main.bin", "maincpu", 1, 0x20, 0)]);
        let section = compile(&g, &cfg);
        let patches: Vec<_> = section
            .node
            .children()
            .iter()
            .filter(|c| c.tag == "patch")
            .collect();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].text, "AA 55");
        assert_eq!(patches[0].attr("offset"), Some("0x10"));
    }

    // ========================================================================
    // Header and device ROMs
    // ========================================================================

    #[test]
    fn test_header_offsets() {
        let cfg = config(
            r#"{
                "header": { "len": 8, "fill": 255, "info": "Region offsets",
                            "offset": { "bits": 8, "regions": ["gfx", "missing"] } },
                "rom": { "order": ["maincpu", "gfx"] }
            }"#,
        );
        let g = game(vec![
            part("main.bin", "maincpu", 1, 0x200, 0),
            part("gfx.bin", "gfx", 2, 0x100, 0),
        ]);
        let section = compile(&g, &cfg);
        let children = section.node.children();

        assert!(children[0].comment);
        assert_eq!(children[0].tag, "Region offsets");
        assert!(children[1].indent_text);
        assert_eq!(children[1].text, "00 02 00 00 FF FF FF FF\n");
        assert_eq!(section.region_offsets.get("gfx"), Some(&0x200));
    }

    #[test]
    fn test_fd1089_table() {
        let cfg = config("{}");
        let mut g = game(vec![part("main.bin", "maincpu", 1, 0x100, 0)]);
        g.devices.push(mra_config::DeviceRef {
            name: "fd1089b".to_string(),
        });
        let section = compile(&g, &cfg);
        assert_eq!(section.size, 0x200);
        assert!(
            comments(&section.node)
                .iter()
                .any(|c| c.starts_with("FD1089 base table starts at 0x100"))
        );
    }

    // ========================================================================
    // Interleaves
    // ========================================================================

    #[test]
    fn test_16bit_interleave() {
        let mut files = Files::new();
        let a = files.add("a.bin", "maincpu", vec![0x11, 0x22, 0x33, 0x44], 0);
        let b = files.add("b.bin", "maincpu", vec![0xaa, 0xbb, 0xcc, 0xdd], 1);
        let cfg = config(r#"{ "rom": { "regions": [ { "name": "maincpu", "width": 16 } ] } }"#);
        let g = game(vec![a, b]);

        let section = compile(&g, &cfg);
        let ilv = interleaves(&section.node);
        assert_eq!(ilv.len(), 1);
        assert_eq!(ilv[0].attr("output"), Some("16"));
        let maps: Vec<_> = ilv[0].children().iter().filter_map(|p| p.attr("map")).collect();
        assert_eq!(maps, vec!["01", "10"]);

        let (_, data) = files.materialize(&g, &cfg);
        assert_eq!(data, vec![0x11, 0xaa, 0x22, 0xbb, 0x33, 0xcc, 0x44, 0xdd]);
    }

    #[test]
    fn test_32bit_word_interleave() {
        let mut files = Files::new();
        let a = files.add("a.bin", "maincpu", vec![1, 2, 3, 4], 0);
        let b = files.add("b.bin", "maincpu", vec![5, 6, 7, 8], 2);
        let cfg = config(r#"{ "rom": { "regions": [ { "name": "maincpu", "width": 32 } ] } }"#);
        let g = game(vec![a, b]);

        let section = compile(&g, &cfg);
        let ilv = interleaves(&section.node);
        let maps: Vec<_> = ilv[0].children().iter().filter_map(|p| p.attr("map")).collect();
        assert_eq!(maps, vec!["0021", "2100"]);

        let (_, data) = files.materialize(&g, &cfg);
        assert_eq!(data, vec![1, 2, 5, 6, 3, 4, 7, 8]);
    }

    #[test]
    fn test_reversed_interleave() {
        let mut files = Files::new();
        let a = files.add("a.bin", "maincpu", vec![1, 2, 3, 4], 0);
        let b = files.add("b.bin", "maincpu", vec![5, 6, 7, 8], 1);
        let c = files.add("c.bin", "maincpu", vec![9, 10], 0x10);
        let cfg = config(
            r#"{ "rom": { "regions": [ { "name": "maincpu", "width": 16, "reverse": true } ] } }"#,
        );
        let g = game(vec![a, b, c]);

        let section = compile(&g, &cfg);
        let ilv = interleaves(&section.node);
        assert_eq!(ilv.len(), 2);
        assert_eq!(part_names(ilv[0]), vec!["b.bin", "a.bin"]);
        assert_eq!(part_names(ilv[1]), vec!["c.bin"]);
        assert_eq!(ilv[1].children()[0].attr("map"), Some("12"));

        let (_, data) = files.materialize(&g, &cfg);
        assert_eq!(data, vec![5, 1, 6, 2, 7, 3, 8, 4, 10, 9]);
    }

    #[test]
    fn test_uneven_interleave() {
        let cfg = config(r#"{ "rom": { "regions": [ { "name": "maincpu", "width": 16 } ] } }"#);
        let g = game(vec![
            part("a.bin", "maincpu", 1, 4, 0),
            part("b.bin", "maincpu", 2, 4, 1),
            part("c.bin", "maincpu", 3, 4, 2),
        ]);
        assert!(matches!(
            compile_rom_section(&g, &cfg, &NoFirmware),
            Err(Error::UnevenInterleave { width: 16, .. })
        ));

        let cfg = config(r#"{ "rom": { "regions": [ { "name": "maincpu", "width": 16, "sort": true } ] } }"#);
        assert!(matches!(
            compile_rom_section(&g, &cfg, &NoFirmware),
            Err(Error::UnevenInterleave { .. })
        ));
    }

    #[test]
    fn test_unsupported_width() {
        let cfg = config(r#"{ "rom": { "regions": [ { "name": "maincpu", "width": 24 } ] } }"#);
        let g = game(vec![
            part("a.bin", "maincpu", 1, 4, 0),
            part("b.bin", "maincpu", 2, 4, 1),
        ]);
        assert!(matches!(
            compile_rom_section(&g, &cfg, &NoFirmware),
            Err(Error::UnsupportedWidth { width: 24, .. })
        ));
    }

    #[test]
    fn test_reversed_straight_dump() {
        let mut files = Files::new();
        let a = files.add("a.bin", "maincpu", vec![1, 2, 3, 4], 0);
        let cfg = config(r#"{ "rom": { "regions": [ { "name": "maincpu", "reverse": true } ] } }"#);
        let g = game(vec![a]);

        let section = compile(&g, &cfg);
        let ilv = interleaves(&section.node);
        assert_eq!(ilv.len(), 1);
        assert_eq!(ilv[0].children()[0].attr("map"), Some("12"));

        let (_, data) = files.materialize(&g, &cfg);
        assert_eq!(data, vec![2, 1, 4, 3]);
    }

    #[test]
    fn test_singleton() {
        let mut files = Files::new();
        let a = files.add("a.bin", "gfx", bytes(0, 8), 0);
        let cfg = config(r#"{ "rom": { "regions": [ { "name": "gfx", "width": 16, "singleton": true } ] } }"#);
        let g = game(vec![a]);

        let section = compile(&g, &cfg);
        let ilv = interleaves(&section.node);
        let halves = ilv[0].children();
        assert_eq!(halves.len(), 2);
        assert_eq!(halves[0].attr("offset"), Some("0x0000"));
        assert_eq!(halves[1].attr("offset"), Some("0x0004"));
        assert_eq!(halves[1].attr("length"), Some("0x0004"));

        let (_, data) = files.materialize(&g, &cfg);
        assert_eq!(data, vec![0, 4, 1, 5, 2, 6, 3, 7]);
    }

    #[test]
    fn test_frac_interleave() {
        let mut files = Files::new();
        let parts = vec![
            files.add("c0", "gfx", bytes(0x00, 4), 0),
            files.add("c1", "gfx", bytes(0x10, 4), 4),
            files.add("c2", "gfx", bytes(0x20, 4), 8),
        ];
        let cfg = config(r#"{ "rom": { "regions": [ { "name": "gfx", "frac": { "bytes": 1, "parts": 2 } } ] } }"#);
        let g = game(parts);

        let section = compile(&g, &cfg);
        let ilv = interleaves(&section.node);
        assert_eq!(ilv.len(), 2);
        assert_eq!(part_names(ilv[1]), vec!["c2", "c2"]);
        assert_eq!(section.size, 16);

        let (_, data) = files.materialize(&g, &cfg);
        assert_eq!(&data[..4], &[0x00, 0x10, 0x01, 0x11]);
        assert_eq!(&data[8..12], &[0x20, 0x20, 0x21, 0x21]);
    }

    #[test]
    fn test_frac_interleave_whole_cohorts() {
        let mut files = Files::new();
        let parts = vec![
            files.add("c0", "gfx", bytes(0x00, 4), 0),
            files.add("c1", "gfx", bytes(0x10, 4), 4),
            files.add("c2", "gfx", bytes(0x20, 4), 8),
            files.add("c3", "gfx", bytes(0x30, 4), 12),
        ];
        let cfg = config(r#"{ "rom": { "regions": [ { "name": "gfx", "frac": { "bytes": 1, "parts": 2 } } ] } }"#);
        let g = game(parts);

        let section = compile(&g, &cfg);
        assert_eq!(interleaves(&section.node).len(), 2);
        assert_eq!(section.size, g.rom_parts.iter().map(|p| p.size).sum::<usize>());

        let (_, data) = files.materialize(&g, &cfg);
        assert_eq!(&data[..8], &[0x00, 0x10, 0x01, 0x11, 0x02, 0x12, 0x03, 0x13]);
        assert_eq!(&data[8..], &[0x20, 0x30, 0x21, 0x31, 0x22, 0x32, 0x23, 0x33]);
    }

    #[test]
    fn test_frac_output_not_even() {
        let cfg = config(r#"{ "rom": { "regions": [ { "name": "gfx", "frac": { "bytes": 1, "parts": 3 } } ] } }"#);
        let g = game(vec![part("c0", "gfx", 1, 4, 0)]);
        assert!(matches!(
            compile_rom_section(&g, &cfg, &NoFirmware),
            Err(Error::FracOutputNotEven { output_bytes: 3, .. })
        ));
    }

    // ========================================================================
    // Splits and blanks
    // ========================================================================

    #[test]
    fn test_split_straight_dump() {
        let mut files = Files::new();
        let a = files.add("a.bin", "gfx", bytes(0, 8), 0);
        let cfg = config(r#"{ "rom": { "splits": [ { "region": "gfx", "offset": 4, "min_len": 8 } ] } }"#);
        let g = game(vec![a]);

        let section = compile(&g, &cfg);
        let parts: Vec<_> = section
            .node
            .children()
            .iter()
            .filter(|c| c.attr("name").is_some())
            .collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].attr("length"), Some("0x4"));
        assert_eq!(parts[1].attr("offset"), Some("0x4"));
        assert_eq!(section.size, 12);

        let (_, data) = files.materialize(&g, &cfg);
        assert_eq!(data, vec![0, 1, 2, 3, 0xff, 0xff, 0xff, 0xff, 4, 5, 6, 7]);
    }

    #[test]
    fn test_split_interleave() {
        let mut files = Files::new();
        let a = files.add("a.bin", "maincpu", bytes(0x00, 8), 0);
        let b = files.add("b.bin", "maincpu", bytes(0x80, 8), 1);
        let cfg = config(
            r#"{ "rom": {
                "regions": [ { "name": "maincpu", "width": 16 } ],
                "splits": [ { "region": "maincpu", "offset": 8, "min_len": 12 } ]
            } }"#,
        );
        let g = game(vec![a, b]);

        let section = compile(&g, &cfg);
        assert!(comments(&section.node).contains(&"ROM split at C (C)"));
        let ilv = interleaves(&section.node);
        assert_eq!(ilv.len(), 2);
        assert_eq!(ilv[0].children()[0].attr("length"), Some("0x4"));
        assert_eq!(ilv[0].children()[0].attr("offset"), None);
        assert_eq!(ilv[1].children()[1].attr("offset"), Some("0x4"));
        assert_eq!(section.size, 0x18);

        let (_, data) = files.materialize(&g, &cfg);
        let ff = [0xffu8; 4];
        let expected: Vec<u8> = [0x00, 0x80, 0x01, 0x81, 0x02, 0x82, 0x03, 0x83]
            .iter()
            .chain(ff.iter())
            .chain([0x04, 0x84, 0x05, 0x85, 0x06, 0x86, 0x07, 0x87].iter())
            .chain(ff.iter())
            .copied()
            .collect();
        assert_eq!(data, expected);
    }

    #[test]
    fn test_blank_insertion() {
        let mut files = Files::new();
        let parts = vec![
            files.add("a.bin", "gfx", bytes(0, 4), 0),
            files.add("b.bin", "gfx", bytes(4, 4), 4),
        ];
        let cfg = config(
            r#"{ "rom": {
                "regions": [ { "name": "gfx", "sort": true } ],
                "blanks": [ { "region": "gfx", "offset": 4, "len": 4 } ]
            } }"#,
        );
        let g = game(parts);

        let section = compile(&g, &cfg);
        assert!(comments(&section.node).contains(&"Blank ends at 0x8"));

        let (_, data) = files.materialize(&g, &cfg);
        assert_eq!(data, vec![0, 1, 2, 3, 0xff, 0xff, 0xff, 0xff, 4, 5, 6, 7]);
    }

    // ========================================================================
    // Invariants
    // ========================================================================

    #[test]
    fn test_deterministic_materialization() {
        let mut files = Files::new();
        let parts = vec![
            files.add("a.bin", "maincpu", bytes(0, 0x10), 0),
            files.add("b.bin", "maincpu", bytes(0x80, 0x10), 1),
            files.add("c.bin", "gfx", bytes(0x40, 0x20), 0),
        ];
        let cfg = config(
            r#"{ "rom": { "order": ["maincpu", "gfx"],
                          "regions": [ { "name": "maincpu", "width": 16 },
                                       { "name": "gfx", "start": 64, "length": 64 } ] } }"#,
        );
        let g = game(parts);

        let (first, data1) = files.materialize(&g, &cfg);
        let (second, data2) = files.materialize(&g, &cfg);
        assert_eq!(data1, data2);
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(data1.len(), 0x80);
    }

    #[test]
    fn test_region_starts_honoured() {
        let cfg = config(
            r#"{ "rom": { "order": ["maincpu", "audiocpu", "gfx"],
                          "regions": [ { "name": "audiocpu", "start": 512 },
                                       { "name": "gfx", "start": 1024 } ] } }"#,
        );
        let g = game(vec![
            part("main.bin", "maincpu", 1, 0x123, 0),
            part("snd.bin", "audiocpu", 2, 0x80, 0),
            part("gfx.bin", "gfx", 3, 0x40, 0),
        ]);
        let section = compile(&g, &cfg);
        assert_eq!(section.region_offsets.get("audiocpu"), Some(&0x200));
        assert_eq!(section.region_offsets.get("gfx"), Some(&0x400));
        assert_eq!(section.size, 0x440);
    }
}
