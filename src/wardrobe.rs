use std::collections::BTreeSet;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostumeId(String);

impl CostumeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CostumeId {
    fn default() -> Self {
        Self::from("cat")
    }
}

impl From<&str> for CostumeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CostumeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for CostumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Costume {
    pub id: CostumeId,
    pub emoji: String,
    pub price: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Background {
    pub name: String,
    pub style: String,
    #[serde(default)]
    pub grid: bool,
}

/// Costume catalog plus the background palette. Catalog order is the cycling order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wardrobe {
    costumes: Vec<Costume>,
    backgrounds: Vec<Background>,
}

impl Default for Wardrobe {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Wardrobe {
    pub fn new(costumes: Vec<Costume>, backgrounds: Vec<Background>) -> Self {
        Self { costumes, backgrounds }
    }

    pub fn builtin() -> Self {
        let costumes = [
            ("cat", "\u{1f431}", 0),
            ("dog", "\u{1f436}", 0),
            ("rocket", "\u{1f680}", 1),
            ("ghost", "\u{1f47b}", 1),
            ("dancer", "\u{1f483}", 2),
            ("robot", "\u{1f916}", 2),
            ("alien", "\u{1f47d}", 3),
            ("dragon", "\u{1f432}", 5),
        ]
        .into_iter()
        .map(|(id, emoji, price)| Costume { id: CostumeId::from(id), emoji: emoji.to_string(), price })
        .collect();
        let backgrounds = [
            ("Sunny Classroom", "bg-classroom", true),
            ("Science Lab", "bg-science-lab", true),
            ("School Playground", "bg-playground", false),
            ("Quiet Library", "bg-library", false),
            ("Sports Gym", "bg-gym", true),
        ]
        .into_iter()
        .map(|(name, style, grid)| Background { name: name.to_string(), style: style.to_string(), grid })
        .collect();
        Self { costumes, backgrounds }
    }

    pub fn costumes(&self) -> &[Costume] {
        &self.costumes
    }

    pub fn costume(&self, id: &CostumeId) -> Option<&Costume> {
        self.costumes.iter().find(|costume| &costume.id == id)
    }

    pub fn backgrounds(&self) -> &[Background] {
        &self.backgrounds
    }

    pub fn background(&self, index: usize) -> Option<&Background> {
        self.backgrounds.get(index)
    }

    /// The free starter costumes: the first two in the catalog.
    pub fn starter_costumes(&self) -> BTreeSet<CostumeId> {
        self.costumes.iter().take(2).map(|costume| costume.id.clone()).collect()
    }

    pub fn default_costume(&self) -> CostumeId {
        self.costumes.first().map(|costume| costume.id.clone()).unwrap_or_default()
    }

    /// Next unlocked costume after `current` in catalog order, wrapping. Returns `None`
    /// when nothing is unlocked. A current costume outside the unlocked list restarts
    /// the cycle at the first unlocked entry.
    pub fn next_costume(&self, current: &CostumeId, unlocked: &BTreeSet<CostumeId>) -> Option<CostumeId> {
        let eligible: Vec<&CostumeId> =
            self.costumes.iter().map(|costume| &costume.id).filter(|id| unlocked.contains(*id)).collect();
        if eligible.is_empty() {
            return None;
        }
        let next = match eligible.iter().position(|id| *id == current) {
            Some(idx) => (idx + 1) % eligible.len(),
            None => 0,
        };
        Some(eligible[next].clone())
    }

    pub fn pick_background<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        if self.backgrounds.is_empty() {
            None
        } else {
            Some(rng.gen_range(0..self.backgrounds.len()))
        }
    }
}
