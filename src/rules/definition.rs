use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use crate::domain::Deck;

pub const DEFAULT_PRIORITY: i32 = 100;

/// Definition as written in a rule file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefinitionRecord {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Conditions")]
    pub conditions: Vec<Condition>,
    #[serde(default, alias = "includeColorInName", alias = "IncludeColorInName")]
    pub include_color_in_name: bool,
    #[serde(default, alias = "Priority")]
    pub priority: Option<i32>,
    #[serde(default, alias = "isFallback", alias = "IsFallback")]
    pub is_fallback: bool,
    #[serde(default, alias = "Variants")]
    pub variants: Vec<VariantRecord>,
}

/// Sub-definition inheriting the parent's conditions
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VariantRecord {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Conditions")]
    pub conditions: Vec<Condition>,
    #[serde(default, alias = "includeColorInName", alias = "IncludeColorInName")]
    pub include_color_in_name: Option<bool>,
    #[serde(default, alias = "Priority")]
    pub priority: Option<i32>,
}

/// How narrowly a definition pins down a deck; larger is more specific
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Specificity {
    pub conditions: usize,
    pub required_cards: usize,
}

/// Flattened, validated archetype definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchetypeDefinition {
    pub name: String,
    pub format: String,
    pub conditions: Vec<Condition>,
    pub include_color_in_name: bool,
    /// Lower wins
    pub priority: i32,
    pub is_fallback: bool,
    pub parent: Option<String>,
}

impl ArchetypeDefinition {
    pub fn matches(&self, deck: &Deck) -> bool {
        self.conditions.iter().all(|c| c.holds(deck))
    }

    pub fn specificity(&self) -> Specificity {
        Specificity {
            conditions: self.conditions.len(),
            required_cards: self.conditions.iter().map(Condition::required_cards).sum(),
        }
    }

    /// Name of the archetype family: the parent for variants
    pub fn base_name(&self) -> &str {
        self.parent.as_deref().unwrap_or(&self.name)
    }

    /// Repository order: priority, then most specific, then name
    pub fn precedence(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.specificity().cmp(&self.specificity()))
            .then_with(|| self.name.cmp(&other.name))
    }

    /// Match resolution order: most specific, then priority, then name
    pub fn resolution_order(&self, other: &Self) -> Ordering {
        other
            .specificity()
            .cmp(&self.specificity())
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl DefinitionRecord {
    /// Base definition followed by one definition per variant
    pub fn flatten(self, format: &str) -> Result<Vec<ArchetypeDefinition>, String> {
        self.validate()?;

        let priority = self.priority.unwrap_or(DEFAULT_PRIORITY);
        let mut definitions = Vec::with_capacity(1 + self.variants.len());

        for variant in &self.variants {
            if variant.name.trim().is_empty() {
                return Err(format!("variant of {} without a name", self.name));
            }
            if variant.conditions.is_empty() {
                return Err(format!("variant {} adds no conditions", variant.name));
            }
            validate_conditions(&variant.name, &variant.conditions)?;

            let mut conditions = self.conditions.clone();
            conditions.extend(variant.conditions.iter().cloned());

            definitions.push(ArchetypeDefinition {
                name: variant.name.trim().to_string(),
                format: format.to_string(),
                conditions,
                include_color_in_name: variant
                    .include_color_in_name
                    .unwrap_or(self.include_color_in_name),
                priority: variant.priority.unwrap_or(priority),
                is_fallback: self.is_fallback,
                parent: Some(self.name.trim().to_string()),
            });
        }

        definitions.insert(
            0,
            ArchetypeDefinition {
                name: self.name.trim().to_string(),
                format: format.to_string(),
                conditions: self.conditions,
                include_color_in_name: self.include_color_in_name,
                priority,
                is_fallback: self.is_fallback,
                parent: None,
            },
        );

        Ok(definitions)
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("definition without a name".to_string());
        }
        // Only a fallback may act as a catch-all
        if self.conditions.is_empty() && !self.is_fallback {
            return Err(format!("definition {} has no conditions", self.name));
        }
        validate_conditions(&self.name, &self.conditions)
    }
}

fn validate_conditions(name: &str, conditions: &[Condition]) -> Result<(), String> {
    conditions
        .iter()
        .try_for_each(|c| c.validate())
        .map_err(|e| format!("definition {}: {}", name, e))
}
