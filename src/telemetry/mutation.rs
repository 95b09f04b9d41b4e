//! DOM-mutation log records.

use serde::{Deserialize, Serialize};

/// Kind of document change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationKind {
    /// Nodes added or removed.
    ChildList,
    /// Attribute changed.
    Attributes,
    /// Text content changed.
    CharacterData,
}

/// One discrete document change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationRecord {
    /// Change kind.
    #[serde(rename = "type")]
    pub kind: MutationKind,
    /// Structural path of the target node.
    pub target: String,
    /// Descriptions of added nodes (child-list changes).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<String>,
    /// Descriptions of removed nodes (child-list changes).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<String>,
    /// Changed attribute name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_name: Option<String>,
    /// Value before the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    /// Value after the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
}

impl MutationRecord {
    /// Creates a child-list record.
    #[must_use]
    pub fn child_list(target: impl Into<String>, added: Vec<String>, removed: Vec<String>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target: target.into(),
            added,
            removed,
            attribute_name: None,
            old_value: None,
            new_value: None,
        }
    }

    /// Creates an attribute record.
    #[must_use]
    pub fn attribute(
        target: impl Into<String>,
        name: impl Into<String>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        Self {
            kind: MutationKind::Attributes,
            target: target.into(),
            added: Vec::new(),
            removed: Vec::new(),
            attribute_name: Some(name.into()),
            old_value,
            new_value,
        }
    }

    /// Creates a character-data record.
    #[must_use]
    pub fn character_data(
        target: impl Into<String>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        Self {
            kind: MutationKind::CharacterData,
            target: target.into(),
            added: Vec::new(),
            removed: Vec::new(),
            attribute_name: None,
            old_value,
            new_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_record_shape() {
        let record = MutationRecord::attribute(
            "body > div#app",
            "class",
            Some("a".into()),
            Some("a b".into()),
        );
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["type"], "attributes");
        assert_eq!(json["attributeName"], "class");
        assert_eq!(json["newValue"], "a b");
        assert!(json.get("added").is_none());
    }
}
