//! Identity reconciliation across inconsistent provider schemas.
//!
//! Providers spell team names and driver codes differently; the alias table
//! collapses the known spellings onto canonical strings and the reconciler
//! merges per-provider metadata fragments into one [`DriverIdentity`] per
//! code. Lookups that find nothing pass the raw value through unchanged:
//! reconciliation degrades to a no-op, it never rejects a record — except
//! when the join key (the driver code) is missing entirely.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::{DriverCode, DriverIdentity};
use crate::source::ProviderId;

const UNKNOWN_TEAM: &str = "Unknown";

/// Static lookup table collapsing provider spellings onto canonical names.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    teams: HashMap<String, String>,
    drivers: HashMap<String, DriverCode>,
}

impl AliasTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The alias set covering the current grid's known spellings.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        for (alias, canonical) in [
            ("red bull", "Red Bull Racing"),
            ("red bull racing", "Red Bull Racing"),
            ("oracle red bull racing", "Red Bull Racing"),
            ("mercedes", "Mercedes"),
            ("ferrari", "Ferrari"),
            ("mclaren", "McLaren"),
            ("aston martin", "Aston Martin"),
            ("alpine", "Alpine"),
            ("haas", "Haas"),
            ("haas f1 team", "Haas"),
            ("williams", "Williams"),
            ("sauber", "Sauber"),
            ("kick sauber", "Sauber"),
            ("alfa romeo", "Sauber"),
            ("rb", "RB"),
            ("racing bulls", "RB"),
            ("alphatauri", "RB"),
            ("scuderia alphatauri", "RB"),
        ] {
            table = table.with_team_alias(alias, canonical);
        }
        table
    }

    pub fn with_team_alias(
        mut self,
        alias: impl AsRef<str>,
        canonical: impl Into<String>,
    ) -> Self {
        self.teams
            .insert(alias.as_ref().trim().to_lowercase(), canonical.into());
        self
    }

    pub fn with_driver_alias(mut self, variant: impl AsRef<str>, canonical: DriverCode) -> Self {
        self.drivers
            .insert(variant.as_ref().trim().to_ascii_uppercase(), canonical);
        self
    }

    /// Canonical team name for a raw provider spelling.
    ///
    /// Unknown spellings pass through unchanged; an empty name becomes
    /// `"Unknown"`.
    pub fn canonical_team(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return String::from(UNKNOWN_TEAM);
        }

        self.teams
            .get(&trimmed.to_lowercase())
            .cloned()
            .unwrap_or_else(|| trimmed.to_owned())
    }

    /// Canonical driver code for a raw provider string.
    ///
    /// Applies code aliases first, then falls back to parsing the raw string
    /// itself; `None` when the value cannot be a code at all.
    pub fn canonical_code(&self, raw: &str) -> Option<DriverCode> {
        let key = raw.trim().to_ascii_uppercase();
        if let Some(code) = self.drivers.get(&key) {
            return Some(code.clone());
        }
        DriverCode::parse(&key).ok()
    }
}

/// Partial driver record as one provider reported it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdentityFragment {
    pub provider: Option<ProviderId>,
    pub code: Option<DriverCode>,
    pub full_name: Option<String>,
    pub team: Option<String>,
    pub country_code: Option<String>,
    pub image_url: Option<String>,
    pub team_color: Option<String>,
    pub number: Option<u32>,
}

impl IdentityFragment {
    pub fn for_provider(provider: ProviderId) -> Self {
        Self {
            provider: Some(provider),
            ..Self::default()
        }
    }
}

/// Merges provider fragments into canonical driver records.
///
/// The alias index is built once and treated as read-only; refreshing it
/// swaps the whole table atomically so in-flight readers keep a consistent
/// snapshot.
pub struct IdentityReconciler {
    aliases: RwLock<Arc<AliasTable>>,
    /// Provider priority, lowest first: later providers win contested fields.
    priority: Vec<ProviderId>,
}

impl IdentityReconciler {
    pub fn new(table: AliasTable) -> Self {
        Self {
            aliases: RwLock::new(Arc::new(table)),
            priority: vec![ProviderId::Ergast, ProviderId::Openf1],
        }
    }

    pub fn with_priority(mut self, priority: Vec<ProviderId>) -> Self {
        self.priority = priority;
        self
    }

    /// Current alias table snapshot.
    pub fn aliases(&self) -> Arc<AliasTable> {
        Arc::clone(&self.aliases.read().expect("alias index lock is not poisoned"))
    }

    /// Replace the alias table wholesale.
    pub fn refresh(&self, table: AliasTable) {
        *self.aliases.write().expect("alias index lock is not poisoned") = Arc::new(table);
    }

    /// Canonicalize a fragment's team name and driver code.
    pub fn resolve(&self, mut fragment: IdentityFragment) -> IdentityFragment {
        let aliases = self.aliases();

        if let Some(team) = fragment.team.take() {
            fragment.team = Some(aliases.canonical_team(&team));
        }
        if let Some(code) = fragment.code.take() {
            fragment.code = aliases.canonical_code(code.as_str());
        }

        fragment
    }

    /// Merge fragments for one driver into a canonical record.
    ///
    /// The first fragment carrying a code fixes the join key; fragments with
    /// a different code are ignored rather than merged by name. Returns
    /// `None` when no fragment carries a code.
    pub fn merge(&self, fragments: &[IdentityFragment]) -> Option<DriverIdentity> {
        let code = fragments.iter().find_map(|f| f.code.clone())?;

        let mut ordered: Vec<&IdentityFragment> = fragments
            .iter()
            .filter(|f| f.code.as_ref() == Some(&code))
            .collect();
        ordered.sort_by_key(|f| self.priority_rank(f.provider));

        let mut identity = DriverIdentity::bare(code);
        for fragment in ordered {
            apply_fragment(&mut identity, fragment);
        }

        Some(identity)
    }

    /// Group resolved fragments by code and merge each group.
    pub fn merge_index(
        &self,
        fragments: Vec<IdentityFragment>,
    ) -> HashMap<DriverCode, DriverIdentity> {
        let mut grouped: HashMap<DriverCode, Vec<IdentityFragment>> = HashMap::new();
        for fragment in fragments {
            let resolved = self.resolve(fragment);
            if let Some(code) = resolved.code.clone() {
                grouped.entry(code).or_default().push(resolved);
            }
        }

        grouped
            .into_iter()
            .filter_map(|(code, group)| self.merge(&group).map(|identity| (code, identity)))
            .collect()
    }

    fn priority_rank(&self, provider: Option<ProviderId>) -> usize {
        provider
            .and_then(|p| self.priority.iter().position(|&candidate| candidate == p))
            // Unlisted providers rank below everything in the priority list.
            .map_or(0, |rank| rank + 1)
    }
}

fn apply_fragment(identity: &mut DriverIdentity, fragment: &IdentityFragment) {
    if let Some(name) = &fragment.full_name {
        identity.full_name = Some(name.clone());
    }
    if let Some(team) = &fragment.team {
        identity.team = Some(team.clone());
    }
    if let Some(country) = &fragment.country_code {
        identity.country_code = Some(country.clone());
    }
    if let Some(url) = &fragment.image_url {
        identity.image_url = Some(url.clone());
    }
    if let Some(color) = &fragment.team_color {
        identity.team_color = Some(color.clone());
    }
    if let Some(number) = fragment.number {
        identity.number = Some(number);
    }
}
