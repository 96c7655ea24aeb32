// Planning data types

use serde::Serialize;

use crate::parsing::{Mapping, Node};

/// A related problem recalled by the model, used to condition planning
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Exemplar {
    pub description: String,
    pub code: String,
    pub planning: String,
    pub techniques: String,
}

/// An exemplar as it came back from the model: either a full record or
/// just a line of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawExemplar {
    Bare(String),
    Full {
        description: String,
        code: String,
        planning: String,
        techniques: String,
    },
}

impl RawExemplar {
    pub fn from_node(node: &Node) -> Option<Self> {
        match node {
            Node::Text(text) => Some(RawExemplar::Bare(text.clone())),
            Node::Map(fields) => Some(RawExemplar::Full {
                description: field_text(fields, "description"),
                code: field_text(fields, "code"),
                planning: field_text(fields, "planning"),
                techniques: field_text(fields, "techniques"),
            }),
            Node::List(_) => None,
        }
    }

    pub fn normalize(self) -> Exemplar {
        match self {
            RawExemplar::Bare(description) => Exemplar {
                description,
                ..Exemplar::default()
            },
            RawExemplar::Full {
                description,
                code,
                planning,
                techniques,
            } => Exemplar {
                description,
                code,
                planning,
                techniques,
            },
        }
    }
}

/// Text of a leaf field, or empty when it is missing or not a leaf.
pub fn field_text(fields: &Mapping, name: &str) -> String {
    fields
        .get(name)
        .and_then(Node::as_text)
        .unwrap_or_default()
        .to_string()
}

/// A scored solution plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub text: String,
    /// Always within 0..=100
    pub confidence: u8,
    pub exemplar: Exemplar,
}

/// Retrieval output shared by every plan of a problem
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedContext {
    /// Algorithm family and tutorial
    pub algorithm: String,
    pub learned_techniques: String,
}

impl SharedContext {
    pub fn algorithm_prompt(&self) -> String {
        format!("## Relevant Algorithm: {}", self.algorithm)
    }

    pub fn techniques_prompt(&self) -> String {
        format!(
            "## Learned Code Generation Techniques: {}",
            self.learned_techniques
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanningOutput {
    /// In exemplar order, not ranked
    pub plans: Vec<Plan>,
    pub context: SharedContext,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_exemplar_normalizes_to_full() {
        let raw = RawExemplar::from_node(&Node::Text("Two sum".into())).unwrap();
        let exemplar = raw.normalize();
        assert_eq!(exemplar.description, "Two sum");
        assert!(exemplar.code.is_empty());
        assert!(exemplar.planning.is_empty());
        assert!(exemplar.techniques.is_empty());
    }

    #[test]
    fn test_full_exemplar_missing_fields_are_empty() {
        let mut fields = Mapping::new();
        fields.insert("description".into(), Node::Text("Knapsack".into()));
        fields.insert("planning".into(), Node::Text("1. dp".into()));
        let exemplar = RawExemplar::from_node(&Node::Map(fields))
            .unwrap()
            .normalize();
        assert_eq!(exemplar.description, "Knapsack");
        assert_eq!(exemplar.planning, "1. dp");
        assert_eq!(exemplar.code, "");
    }

    #[test]
    fn test_nested_list_is_not_an_exemplar() {
        assert!(RawExemplar::from_node(&Node::List(vec![])).is_none());
    }
}
