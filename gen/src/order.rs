// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Reordering of the files of a region before they are laid out.

use core::cmp::Ordering;

use lazy_static::lazy_static;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use mra_config::{OrderStrategy, RegionRule, RomPart};
use regex::Regex;

use crate::{Error, Result};

lazy_static! {
    static ref DIGITS: Regex = Regex::new("[0-9]+").unwrap();
}

/// Reorders the files of a region as its rule asks
pub fn apply_order(rule: &RegionRule, parts: Vec<RomPart>, setname: &str) -> Result<Vec<RomPart>> {
    let parts = match rule.order_strategy() {
        OrderStrategy::Declared => parts,
        OrderStrategy::Sequence(sequence) => apply_sequence(&rule.name, sequence, parts),
        OrderStrategy::ExtensionList(exts) => {
            pick_by_priority(parts, exts, |part, ext| part.name.ends_with(ext.as_str()))
        }
        OrderStrategy::NameList(names) => {
            pick_by_priority(parts, names, |part, name| part.name == *name)
        }
        OrderStrategy::RegexList(patterns) => {
            let regexes = patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|e| Error::InvalidRegex {
                        region: rule.name.clone(),
                        pattern: p.clone(),
                        error: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            pick_by_priority(parts, &regexes, |part, re| re.is_match(&part.name))
        }
        OrderStrategy::EvenOdd { even_first } => {
            if !even_first {
                return Err(Error::UnimplementedSort {
                    region: rule.name.clone(),
                    strategy: "odd first",
                });
            }
            even_then_odd(parts)
        }
        OrderStrategy::ByExtension { alpha, reverse } => {
            let mut parts = sort_by_extension(&rule.name, parts, alpha, setname);
            if reverse {
                parts.reverse();
            }
            parts
        }
        OrderStrategy::FullSort { alpha } => {
            let mut parts = parts;
            parts.sort_by(|a, b| name_cmp(&a.name, &b.name, alpha));
            parts
        }
    };

    debug!(
        "Region {} order: {}",
        rule.name,
        parts.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(",")
    );
    Ok(parts)
}

// Positions past the end select the first file, as some sets have fewer
// files than others in the same family
fn apply_sequence(region: &str, sequence: &[usize], parts: Vec<RomPart>) -> Vec<RomPart> {
    if parts.is_empty() {
        warn!("Attempting to sort empty region {region}");
        return parts;
    }
    sequence
        .iter()
        .map(|&ii| parts.get(ii).unwrap_or(&parts[0]).clone())
        .collect()
}

/// Files picked by each entry of the priority list come first, in list
/// order.  Files not picked follow in their original order.
fn pick_by_priority<T, F>(parts: Vec<RomPart>, priorities: &[T], matches: F) -> Vec<RomPart>
where
    F: Fn(&RomPart, &T) -> bool,
{
    let mut remaining: Vec<Option<RomPart>> = parts.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(remaining.len());

    for priority in priorities {
        if let Some(slot) = remaining
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|p| matches(p, priority)))
        {
            ordered.extend(slot.take());
        }
    }
    ordered.extend(remaining.into_iter().flatten());
    ordered
}

fn even_then_odd(parts: Vec<RomPart>) -> Vec<RomPart> {
    let (even, odd): (Vec<_>, Vec<_>) = parts.into_iter().enumerate().partition(|(ii, _)| ii % 2 == 0);
    even.into_iter().chain(odd).map(|(_, p)| p).collect()
}

fn extension(name: &str) -> Option<&str> {
    name.rfind('.').map(|ii| &name[ii..])
}

fn sort_by_extension(region: &str, mut parts: Vec<RomPart>, alpha: bool, setname: &str) -> Vec<RomPart> {
    let first = parts.first().map(|p| extension(&p.name));
    let all_equal = parts.iter().all(|p| Some(extension(&p.name)) == first);

    if all_equal {
        debug!("Sorting {region} by name as all extensions are equal ({setname})");
        parts.sort_by(|a, b| name_cmp(&a.name, &b.name, alpha));
    } else {
        parts.sort_by(|a, b| match (extension(&a.name), extension(&b.name)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(ea), Some(eb)) if alpha => ea.cmp(eb),
            (Some(ea), Some(eb)) => numeric_cmp(ea, eb),
        });
    }
    parts
}

fn name_cmp(a: &str, b: &str, alpha: bool) -> Ordering {
    if alpha {
        a.cmp(b)
    } else {
        numeric_cmp(strip_extension(a), strip_extension(b)).then_with(|| a.cmp(b))
    }
}

fn strip_extension(name: &str) -> &str {
    name.rfind('.').map(|ii| &name[..ii]).unwrap_or(name)
}

/// Compares the runs of digits embedded in both names as integers, in
/// order.  Falls back to plain comparison when they are all equal.
pub fn numeric_cmp(a: &str, b: &str) -> Ordering {
    for (da, db) in DIGITS.find_iter(a).zip(DIGITS.find_iter(b)) {
        let (da, db) = (da.as_str().trim_start_matches('0'), db.as_str().trim_start_matches('0'));
        let ord = da.len().cmp(&db.len()).then_with(|| da.cmp(db));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.cmp(b)
}
