// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Core macro definitions.

use anyhow::{Context, Result};
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use mra_config::Macros;
use std::fs;
use std::path::Path;

/// Parses a `NAME=VALUE` argument
pub fn parse_define(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid definition: {s}. Expected NAME=VALUE"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Invalid definition: {s}. The name is empty"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Parses a macro file.  Blank lines and lines starting with `#` or `//`
/// are ignored.  A name without a value is defined as empty.
pub fn parse_macros(text: &str) -> Macros {
    let mut macros = Macros::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        let (name, value) = line.split_once('=').unwrap_or((line, ""));
        macros.insert(name.trim().to_string(), value.trim().to_string());
    }
    macros
}

/// Loads the macro file, if any, then applies the command line definitions
pub fn load_macros(path: Option<&Path>, defines: &[(String, String)]) -> Result<Macros> {
    let mut macros = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Cannot read macro file {}", path.display()))?;
            parse_macros(&text)
        }
        None => Macros::new(),
    };
    for (name, value) in defines {
        if let Some(old) = macros.insert(name.clone(), value.clone()) {
            debug!("{name} redefined from {old} to {value}");
        }
    }
    debug!("{} macros defined", macros.len());
    Ok(macros)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_define() {
        assert_eq!(
            parse_define("JTFRAME_HEADER = 0x20"),
            Ok(("JTFRAME_HEADER".to_string(), "0x20".to_string()))
        );
        assert_eq!(parse_define("A=b=c"), Ok(("A".to_string(), "b=c".to_string())));
        assert!(parse_define("JTFRAME_HEADER").is_err());
        assert!(parse_define("=1").is_err());
    }

    #[test]
    fn test_parse_macros() {
        let macros = parse_macros(
            "# core settings\nCORENAME=JTCPS1\n\n// banks\nJTFRAME_BA1_START=0x10_0000\nJTFRAME_VERTICAL\n",
        );
        assert_eq!(macros.len(), 3);
        assert_eq!(macros["CORENAME"], "JTCPS1");
        assert_eq!(macros["JTFRAME_BA1_START"], "0x10_0000");
        assert_eq!(macros["JTFRAME_VERTICAL"], "");
    }

    #[test]
    fn test_defines_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros.def");
        fs::write(&path, "JTFRAME_HEADER=32\nCORENAME=JTKICKER\n").unwrap();

        let defines = vec![("JTFRAME_HEADER".to_string(), "64".to_string())];
        let macros = load_macros(Some(&path), &defines).unwrap();
        assert_eq!(macros["JTFRAME_HEADER"], "64");
        assert_eq!(macros["CORENAME"], "JTKICKER");

        assert!(load_macros(Some(&dir.path().join("missing.def")), &[]).is_err());
    }
}
