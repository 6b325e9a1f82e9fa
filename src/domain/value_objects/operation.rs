//! Operation value object - the CRUD verbs an object type can be dispatched on

use serde::{Deserialize, Serialize};

/// Operation requested on an object type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Query,
    Get,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Create,
        Operation::Query,
        Operation::Get,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Query => "query",
            Operation::Get => "get",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_display_is_lowercase() {
        assert_eq!(Operation::Create.to_string(), "create");
        assert_eq!(Operation::Delete.to_string(), "delete");
    }

    #[test]
    fn operation_serde_roundtrip() {
        let json = serde_json::to_string(&Operation::Query).unwrap();
        assert_eq!(json, "\"query\"");
        let back: Operation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Operation::Query);
    }
}
