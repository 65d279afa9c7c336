//! Static name dictionary (spec §3 `NameDictionary`, §4.2 rule classifier
//! backing store). Loaded once at startup; immutable thereafter.
//!
//! The seed set below is grounded in the original tool's own test fixtures
//! (`tests/unit/classification/test_rules.py`, `test_phonetic.py`): the same
//! representative South African given names and surnames per ethnicity
//! group, including the "month surname" convention for `coloured`
//! classifications.

use crate::model::Ethnicity;
use std::collections::HashMap;

/// A single dictionary entry, corresponding to one normalized name (full
/// name, surname, or given name) mapped to exactly one ethnicity.
#[derive(Clone, Debug)]
pub struct NameDictEntry {
    pub name: String,
    pub ethnicity: Ethnicity,
    pub priority: u8,
    pub confidence_base: f64,
}

/// Which positional role a seed name plays; drives the confidence_base
/// picked at load time (spec §4.2: 0.95 full-name, 0.85 surname, 0.75
/// given-name).
#[derive(Clone, Copy)]
enum Role {
    FullName,
    Surname,
    GivenName,
}

pub struct NameDictionary {
    entries: HashMap<String, NameDictEntry>,
}

impl NameDictionary {
    /// Build the dictionary from the embedded seed list, resolving
    /// duplicate keys by priority (spec §3 invariant: one ethnicity per
    /// normalized form).
    pub fn load_seed() -> Self {
        let mut entries: HashMap<String, NameDictEntry> = HashMap::new();
        for (name, ethnicity, role, priority) in seed_rows() {
            let confidence_base = match role {
                Role::FullName => crate::config::RULE_CONFIDENCE_FULL_NAME,
                Role::Surname => crate::config::RULE_CONFIDENCE_SURNAME,
                Role::GivenName => crate::config::RULE_CONFIDENCE_GIVEN_NAME,
            };
            let candidate = NameDictEntry {
                name: name.to_string(),
                ethnicity,
                priority,
                confidence_base,
            };
            entries
                .entry(name.to_string())
                .and_modify(|existing| {
                    if candidate.priority > existing.priority {
                        *existing = candidate.clone();
                    }
                })
                .or_insert(candidate);
        }
        Self { entries }
    }

    pub fn get(&self, normalized: &str) -> Option<&NameDictEntry> {
        self.entries.get(normalized)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NameDictEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Coverage statistics, grounded in the original's
    /// `get_coverage_stats()` used for CLI/test reporting.
    pub fn coverage_stats(&self) -> HashMap<Ethnicity, usize> {
        let mut stats: HashMap<Ethnicity, usize> = HashMap::new();
        for entry in self.entries.values() {
            *stats.entry(entry.ethnicity).or_insert(0) += 1;
        }
        stats
    }
}

/// `(normalized_name, ethnicity, role, priority)` — priority is higher for
/// surnames than given names since surnames are the stronger signal under
/// the surname-priority rule (spec §4.2), used only to break ties when the
/// same token is seeded under two roles.
fn seed_rows() -> Vec<(&'static str, Ethnicity, Role, u8)> {
    use Ethnicity::*;
    use Role::*;
    vec![
        // African
        ("bongani", African, GivenName, 1),
        ("mthembu", African, Surname, 2),
        ("thabo", African, GivenName, 1),
        ("mandela", African, Surname, 2),
        ("nomsa", African, GivenName, 1),
        ("khumalo", African, Surname, 2),
        ("kagiso", African, GivenName, 1),
        ("ramaphosa", African, Surname, 2),
        ("dlamini", African, Surname, 2),
        ("sipho", African, GivenName, 1),
        ("ngcobo", African, Surname, 2),
        ("zanele", African, GivenName, 1),
        ("ndaba", African, Surname, 2),
        ("lucky", African, GivenName, 1),

        // Indian
        ("priya", Indian, GivenName, 1),
        ("pillay", Indian, Surname, 2),
        ("rajesh", Indian, GivenName, 1),
        ("naidoo", Indian, Surname, 2),
        ("anita", Indian, GivenName, 1),
        ("reddy", Indian, Surname, 2),
        ("ashwin", Indian, GivenName, 1),
        ("patel", Indian, Surname, 2),

        // Cape Malay
        ("abdullah", CapeMalay, GivenName, 1),
        ("cassiem", CapeMalay, Surname, 2),
        ("fatima", CapeMalay, GivenName, 1),
        ("hendricks", CapeMalay, Surname, 2),
        ("mohamed", CapeMalay, GivenName, 1),
        ("adams", CapeMalay, Surname, 2),

        // Coloured — month surnames are the classic South African convention.
        ("september", Coloured, Surname, 2),
        ("april", Coloured, Surname, 2),
        ("october", Coloured, Surname, 2),
        ("mary", Coloured, GivenName, 1),
        ("david", Coloured, GivenName, 1),

        // White
        ("pieter", White, GivenName, 1),
        ("botha", White, Surname, 2),
        ("johannes", White, GivenName, 1),
        ("smith", White, Surname, 2),
        ("merwe", White, Surname, 2),
        ("john", White, GivenName, 1),
        ("sarah", White, GivenName, 1),
        ("wilson", White, Surname, 2),
        ("brown", White, Surname, 2),
        ("davis", White, Surname, 2),
        ("emma", White, GivenName, 1),
        ("johnson", White, Surname, 2),
        ("michael", White, GivenName, 1),
    ]
}
