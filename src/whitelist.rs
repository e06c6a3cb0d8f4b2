// ⭐ Whitelist - Hand-curated organizations, checked before anything dynamic
//
// Keys are human-readable lowercase names and aliases ("a16z",
// "andreessen horowitz"). Lookup is exact after `whitelist_key`; there is no
// fuzzy or partial matching.

use crate::normalize::whitelist_key;
use crate::taxonomy::{is_legal, OrgFocus, OrgType};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

// ============================================================================
// ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub org_type: OrgType,
    pub focus: OrgFocus,
    pub ceo: String,
    pub thesis: String,
}

/// One CSV row: an alias plus the entry it resolves to
#[derive(Debug, Deserialize)]
struct WhitelistRow {
    alias: String,
    name: String,
    #[serde(rename = "type")]
    org_type: String,
    focus: String,
    ceo: String,
    thesis: String,
}

// (alias, name, type, focus, ceo, thesis)
type Seed = (&'static str, &'static str, OrgType, OrgFocus, &'static str, &'static str);

const DEFAULT_ENTRIES: &[Seed] = {
    use OrgFocus::*;
    use OrgType::*;

    &[
        // GRANT + DEEP_TECH
        ("eic", "European Innovation Council", Grant, DeepTech, "Jean-David Malo", "Breakthrough innovation funding for deep tech startups"),
        ("eic accelerator", "EIC Accelerator", Grant, DeepTech, "Jean-David Malo", "Grant + equity funding for breakthrough innovations"),
        ("horizon europe", "Horizon Europe", Grant, DeepTech, "Marc Lemaître", "EU research and innovation framework programme"),
        ("horizon 2020", "Horizon 2020", Grant, DeepTech, "Marc Lemaître", "EU research and innovation programme 2014-2020"),
        // GRANT + CLIMATE
        ("eic climate", "EIC Climate", Grant, Climate, "Jean-David Malo", "Climate tech breakthrough funding"),
        ("innovation fund", "EU Innovation Fund", Grant, Climate, "Kurt Vandenberghe", "Large-scale climate innovation funding"),
        // VC + CLIMATE
        ("world fund", "World Fund", Vc, Climate, "Daria Saharova", "Climate tech VC targeting 100Mt CO₂ reduction potential"),
        ("pale blue dot", "Pale Blue Dot", Vc, Climate, "Heidi Lindvall", "European climate tech venture capital"),
        ("extantia", "Extantia", Vc, Climate, "Michael Stephan", "Climate tech VC for carbon removal and reduction"),
        // VC + DEEP_TECH
        ("htgf", "High-Tech Gründerfonds", Vc, DeepTech, "Alex von Frankenberg", "German seed VC for technology startups"),
        ("high-tech gründerfonds", "High-Tech Gründerfonds", Vc, DeepTech, "Alex von Frankenberg", "German seed VC for technology startups"),
        ("sequoia", "Sequoia Capital", Vc, DeepTech, "Roelof Botha", "Global venture capital for transformative companies"),
        ("sequoia capital", "Sequoia Capital", Vc, DeepTech, "Roelof Botha", "Global venture capital for transformative companies"),
        ("a16z", "Andreessen Horowitz", Vc, DeepTech, "Marc Andreessen", "Software eating the world"),
        ("andreessen horowitz", "Andreessen Horowitz", Vc, DeepTech, "Marc Andreessen", "Software eating the world"),
        ("lakestar", "Lakestar", Vc, DeepTech, "Klaus Hommels", "European tech venture capital"),
        // VC + DEFENCE
        ("nato innovation fund", "NATO Innovation Fund", Vc, Defence, "Andrea Traversone", "Deep tech for defence and security"),
        ("nato if", "NATO Innovation Fund", Vc, Defence, "Andrea Traversone", "Deep tech for defence and security"),
        ("decisive point", "Decisive Point", Vc, Defence, "John Walters", "Critical technologies for defence, energy and infrastructure"),
        // VC + ENERGY
        ("set ventures", "SET Ventures", Vc, Energy, "Rene Savelsberg", "Energy transition venture capital"),
        ("energy impact partners", "Energy Impact Partners", Vc, Energy, "Hans Kobler", "Energy transition and sustainability"),
        // CVC + ENERGY
        ("equinor ventures", "Equinor Ventures", Cvc, Energy, "Gareth Burns", "Energy transition corporate venture capital"),
        ("shell ventures", "Shell Ventures", Cvc, Energy, "Geert van de Wouw", "Energy and mobility innovation"),
        ("bp ventures", "BP Ventures", Cvc, Energy, "Meghan Sharp", "Energy transition and decarbonization"),
        ("eon ventures", "E.ON Ventures", Cvc, Energy, "Jan Lozek", "Energy innovation and grid solutions"),
        ("e.on ventures", "E.ON Ventures", Cvc, Energy, "Jan Lozek", "Energy innovation and grid solutions"),
        // BANK + INDUSTRIAL
        ("kfw", "KfW", Bank, Industrial, "Stefan Wintels", "German development bank for sustainable growth"),
        ("kreditanstalt für wiederaufbau", "KfW", Bank, Industrial, "Stefan Wintels", "German development bank for sustainable growth"),
        ("eib", "European Investment Bank", Bank, Industrial, "Werner Hoyer", "EU long-term lending institution"),
        ("european investment bank", "European Investment Bank", Bank, Industrial, "Werner Hoyer", "EU long-term lending institution"),
        ("deutsche bank", "Deutsche Bank", Bank, Industrial, "Christian Sewing", "Global financial services"),
        // GOVERNMENT + DEFENCE
        ("bundeswehr", "Bundeswehr", Government, Defence, "Boris Pistorius", "German armed forces procurement"),
        ("nato", "NATO", Government, Defence, "Mark Rutte", "Alliance defence and security"),
        ("bwi", "BWI GmbH", Government, Defence, "Martin Kaloudis", "Bundeswehr IT services"),
        // STRATEGIC + ENERGY
        ("aramco", "Saudi Aramco", Strategic, Energy, "Amin H. Nasser", "Global energy leader diversifying portfolio"),
        ("saudi aramco", "Saudi Aramco", Strategic, Energy, "Amin H. Nasser", "Global energy leader diversifying portfolio"),
        ("vattenfall", "Vattenfall", Strategic, Energy, "Anna Borg", "Fossil-free energy within one generation"),
        // STRATEGIC + INFRASTRUCTURE
        ("deutsche telekom", "Deutsche Telekom", Strategic, Infrastructure, "Tim Höttges", "Telecommunications infrastructure"),
        ("vodafone", "Vodafone", Strategic, Infrastructure, "Margherita Della Valle", "Connectivity and digital services"),
        ("siemens", "Siemens", Strategic, Infrastructure, "Roland Busch", "Industrial automation and digitalization"),
    ]
};

// ============================================================================
// WHITELIST
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    entries: HashMap<String, WhitelistEntry>,
}

impl Whitelist {
    /// Empty whitelist (every lookup misses)
    pub fn new() -> Self {
        Whitelist {
            entries: HashMap::new(),
        }
    }

    /// Whitelist with the curated organizations pre-loaded
    pub fn with_defaults() -> Self {
        let mut whitelist = Whitelist::new();

        for &(alias, name, org_type, focus, ceo, thesis) in DEFAULT_ENTRIES {
            whitelist.entries.insert(
                whitelist_key(alias),
                WhitelistEntry {
                    name: name.to_string(),
                    org_type,
                    focus,
                    ceo: ceo.to_string(),
                    thesis: thesis.to_string(),
                },
            );
        }

        whitelist
    }

    /// Add an entry under an alias. Rejects combinations outside the
    /// adjacency matrix.
    pub fn insert(&mut self, alias: &str, entry: WhitelistEntry) -> Result<()> {
        if !is_legal(entry.org_type, entry.focus) {
            bail!(
                "Whitelist entry '{}' has illegal combination {} × {}",
                alias,
                entry.org_type,
                entry.focus
            );
        }

        let key = whitelist_key(alias);
        if key.is_empty() {
            bail!("Whitelist alias for '{}' is empty", entry.name);
        }

        self.entries.insert(key, entry);
        Ok(())
    }

    /// Load extra curated rows from a CSV file with the header
    /// `alias,name,type,focus,ceo,thesis`. Returns how many rows were added.
    pub fn extend_from_csv<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let mut rdr = csv::Reader::from_path(path.as_ref())
            .with_context(|| format!("Failed to open whitelist CSV: {:?}", path.as_ref()))?;

        let mut added = 0;
        for (line, row) in rdr.deserialize::<WhitelistRow>().enumerate() {
            let row = row.with_context(|| format!("Bad whitelist row {}", line + 2))?;

            let org_type = OrgType::parse(row.org_type.trim())
                .with_context(|| format!("Unknown type '{}' for '{}'", row.org_type, row.alias))?;
            let focus = OrgFocus::parse(row.focus.trim())
                .with_context(|| format!("Unknown focus '{}' for '{}'", row.focus, row.alias))?;

            self.insert(
                &row.alias,
                WhitelistEntry {
                    name: row.name,
                    org_type,
                    focus,
                    ceo: row.ceo,
                    thesis: row.thesis,
                },
            )?;
            added += 1;
        }

        Ok(added)
    }

    /// Exact lookup after whitelist normalization
    pub fn lookup(&self, raw_name: &str) -> Option<&WhitelistEntry> {
        self.entries.get(&whitelist_key(raw_name))
    }

    /// All (alias, entry) pairs sorted by alias
    pub fn entries(&self) -> Vec<(&str, &WhitelistEntry)> {
        let mut all: Vec<(&str, &WhitelistEntry)> = self
            .entries
            .iter()
            .map(|(alias, entry)| (alias.as_str(), entry))
            .collect();
        all.sort_by(|a, b| a.0.cmp(b.0));
        all
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
