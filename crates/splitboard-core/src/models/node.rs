use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// `(0,0)` is the "never laid out" sentinel, not a real coordinate.
    pub fn is_unset(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Master,
    Topic,
}

/// A branch in the mind-map forest. Serialized inside `AIState.structure`
/// with the camelCase field names the hosted schema stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatNode {
    pub id: String,
    pub label: String,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub is_collapsed: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl ChatNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, parent_id: Option<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            parent_id,
            children: Vec::new(),
            is_collapsed: false,
            node_type: None,
            position: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_wire_format() {
        let node: ChatNode = serde_json::from_str(
            r#"{"id":"n1","label":"Topic","parentId":null,"children":["n2"],"isCollapsed":true,"type":"topic"}"#,
        )
        .unwrap();
        assert!(node.parent_id.is_none());
        assert!(node.is_collapsed);
        assert_eq!(node.node_type, Some(NodeType::Topic));

        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains(r#""parentId":null"#));
        assert!(json.contains(r#""isCollapsed":true"#));
        assert!(json.contains(r#""type":"topic""#));
    }

    #[test]
    fn test_unset_position_sentinel() {
        assert!(Position { x: 0.0, y: 0.0 }.is_unset());
        assert!(!Position { x: 12.0, y: 0.0 }.is_unset());
    }
}
