pub mod condition;
pub mod definition;
pub mod repository;

pub use condition::{CardRequirement, CardSet, Condition, Scope};
pub use definition::{ArchetypeDefinition, DefinitionRecord, Specificity, VariantRecord};
pub use repository::{RuleRepository, RuleSet};
