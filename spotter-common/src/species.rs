//! Canonical species registry
//!
//! The registry is an immutable, ordered list of the species the service
//! recognizes. Order is authored priority: when a fuzzy lookup could match
//! several entries, the earliest one wins.
//!
//! Loaded once at startup and shared behind an `Arc`; nothing mutates it.

use serde::Serialize;

/// A canonical registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Species {
    pub common_name: String,
    pub scientific_name: String,
}

impl Species {
    pub fn new(common_name: impl Into<String>, scientific_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            scientific_name: scientific_name.into(),
        }
    }
}

/// Invasive wetland species tracked in Alachua County, in priority order
const BUILTIN_SPECIES: &[(&str, &str)] = &[
    ("Air Potato", "Dioscorea bulbifera"),
    ("Coral Adicea", "Ardicia Crenata"),
    ("Spanish Gold", "Sesbania Punicea"),
    ("Torpedo Grass", "Panicum repens"),
    ("Wedelia", "Wedelia Trilobata"),
    ("Caeser's Weed", "Urena Lobata"),
    ("Wandering Jew / Small Leaf", "Tradescantia fluminensis"),
    ("Wild Taro and Elephant Ear", "Colocasia esculenta & Xanthosoma"),
    ("Japanese Climbing Fern", "Lygodium japonicum"),
    ("Chinese Tallow", "Sapium sebiferum"),
    ("Camphor", "Cinnamomum camphora"),
    ("Mimosa", "Albizia julibrissin"),
    ("Shrub Lantana", "Lantana camara"),
    ("Boston or Sword Fern", "Nephrolepis cordifolia"),
    ("Winged Yam", "Dioscorea alata"),
    ("Tropical Soda Apple", "Solanum viarum"),
    ("Cogon Grass", "Imperata cylindrica"),
];

/// Ordered, read-only species registry
#[derive(Debug, Clone)]
pub struct SpeciesRegistry {
    entries: Vec<Species>,
    // Lowercased common names, index-aligned with `entries`
    folded: Vec<String>,
}

impl SpeciesRegistry {
    /// Build a registry from entries in priority order
    ///
    /// Duplicate common names (case-insensitive) keep the first occurrence.
    pub fn new(entries: Vec<Species>) -> Self {
        let mut kept = Vec::with_capacity(entries.len());
        let mut folded: Vec<String> = Vec::with_capacity(entries.len());

        for species in entries {
            let key = species.common_name.to_lowercase();
            if folded.contains(&key) {
                tracing::warn!(
                    common_name = %species.common_name,
                    "Duplicate species in registry, keeping first entry"
                );
                continue;
            }
            folded.push(key);
            kept.push(species);
        }

        Self {
            entries: kept,
            folded,
        }
    }

    /// The compiled-in registry
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_SPECIES
                .iter()
                .map(|(common, scientific)| Species::new(*common, *scientific))
                .collect(),
        )
    }

    /// Entries in priority order
    pub fn entries(&self) -> &[Species] {
        &self.entries
    }

    /// Common names in priority order
    pub fn common_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.common_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive equality on the common name
    pub fn lookup_exact(&self, name: &str) -> Option<&Species> {
        let needle = name.to_lowercase();
        self.folded
            .iter()
            .position(|candidate| *candidate == needle)
            .map(|idx| &self.entries[idx])
    }

    /// Case-insensitive containment in either direction
    ///
    /// Matches when the canonical common name appears inside `text`, or `text`
    /// appears inside the canonical common name. Returns the first match in
    /// registry order. Empty text never matches.
    pub fn lookup_fuzzy(&self, text: &str) -> Option<&Species> {
        let needle = text.to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.folded
            .iter()
            .position(|canonical| needle.contains(canonical.as_str()) || canonical.contains(&needle))
            .map(|idx| &self.entries[idx])
    }

    /// Exact lookup, falling back to fuzzy
    pub fn resolve(&self, text: &str) -> Option<&Species> {
        self.lookup_exact(text).or_else(|| self.lookup_fuzzy(text))
    }
}

impl Default for SpeciesRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
