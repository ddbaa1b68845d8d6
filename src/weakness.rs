//! Type weakness index built from PokeAPI damage relations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The 18 type names the index is built for.
pub const TYPE_NAMES: [&str; 18] = [
    "normal", "fire", "water", "electric", "grass", "ice", "fighting", "poison", "ground",
    "flying", "psychic", "bug", "rock", "ghost", "dragon", "dark", "steel", "fairy",
];

/// Maps a defending type to the attacking types that deal double damage to it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeWeaknessIndex {
    weaknesses: HashMap<String, Vec<String>>,
}

impl TypeWeaknessIndex {
    pub fn get(&self, type_name: &str) -> &[String] {
        self.weaknesses
            .get(type_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Union of the weaknesses of every given type, deduplicated, in first-seen order.
    pub fn weaknesses_for(&self, types: &[String]) -> Vec<String> {
        let mut merged: Vec<String> = Vec::new();
        for type_name in types {
            for weakness in self.get(type_name) {
                if !merged.contains(weakness) {
                    merged.push(weakness.clone());
                }
            }
        }
        merged
    }

    /// Defending types the index has relations for.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.weaknesses.keys().map(String::as_str)
    }
}

impl FromIterator<(String, Vec<String>)> for TypeWeaknessIndex {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self {
            weaknesses: iter.into_iter().collect(),
        }
    }
}
