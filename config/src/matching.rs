// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Priority matching of configuration rules against a machine.
//!
//! Most configuration entries carry an optional `machine` and an optional
//! `setname` filter.  An entry naming the exact setname beats one naming the
//! machine family, which beats one with no filter at all.

use crate::GameRecord;

/// How well a rule matches a machine.  Ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    /// Filter present but does not match
    None,
    /// No filter - applies to every machine
    Wildcard,
    /// `machine` names this setname or its parent
    Family,
    /// `setname` names this exact setname
    Setname,
}

impl MatchTier {
    /// Evaluate a `machine`/`setname` filter pair against a game
    pub fn of(machine: &str, setname: &str, game: &GameRecord) -> Self {
        if !setname.is_empty() && setname == game.name {
            MatchTier::Setname
        } else if game.is_family(machine) {
            MatchTier::Family
        } else if machine.is_empty() && setname.is_empty() {
            MatchTier::Wildcard
        } else {
            MatchTier::None
        }
    }

    pub fn matches(&self) -> bool {
        *self != MatchTier::None
    }
}

/// Implemented by configuration entries filtered per machine
pub trait MachineFilter {
    fn machine(&self) -> &str;
    fn setname(&self) -> &str;

    fn tier(&self, game: &GameRecord) -> MatchTier {
        MatchTier::of(self.machine(), self.setname(), game)
    }

    fn applies_to(&self, game: &GameRecord) -> bool {
        self.tier(game).matches()
    }
}

/// Picks the best matching entry.  The highest tier wins and the first
/// entry wins within a tier.
pub fn best_match<'a, T, I>(entries: I, game: &GameRecord) -> Option<&'a T>
where
    T: MachineFilter + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut best: Option<(MatchTier, &'a T)> = None;
    for entry in entries {
        let tier = entry.tier(game);
        if !tier.matches() {
            continue;
        }
        match best {
            Some((best_tier, _)) if best_tier >= tier => {}
            _ => best = Some((tier, entry)),
        }
        if tier == MatchTier::Setname {
            break;
        }
    }
    best.map(|(_, entry)| entry)
}

/// Picks the last matching entry of any tier.  Used by rules where later
/// entries in the configuration override earlier ones.
pub fn last_match<'a, T, I>(entries: I, game: &GameRecord) -> Option<&'a T>
where
    T: MachineFilter + 'a,
    I: IntoIterator<Item = &'a T>,
{
    entries.into_iter().filter(|e| e.applies_to(game)).last()
}
