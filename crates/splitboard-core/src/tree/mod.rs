//! Mind-map forest operations.
//!
//! The node structure lives inside `AIState.structure` and is persisted
//! wholesale; these functions mutate a structure in place and leave
//! persistence to the hybrid store.

pub mod layout;

use anyhow::{bail, Result};

use crate::models::{timestamp_id, ChatNode, Message, NodeType, Position, Sender};

/// Outcome of [`add_child`]: the new node's id, plus the synthetic message
/// seeding the new conversation partition when context was inherited.
#[derive(Debug, Clone)]
pub struct AddChild {
    pub node_id: String,
    pub seed: Option<Message>,
}

fn find(structure: &[ChatNode], node_id: &str) -> Option<usize> {
    structure.iter().position(|n| n.id == node_id)
}

/// Flip `is_collapsed` on one node. Returns false when the id is unknown.
pub fn toggle_collapse(structure: &mut [ChatNode], node_id: &str) -> bool {
    match structure.iter_mut().find(|n| n.id == node_id) {
        Some(node) => {
            node.is_collapsed = !node.is_collapsed;
            true
        }
        None => false,
    }
}

/// Create a node under `parent_id` (or a new root when `None`) and link it
/// into the parent's `children`. Fails before any mutation when the parent
/// id is dangling, so the structure never holds a half-applied insert.
pub fn add_child(
    structure: &mut Vec<ChatNode>,
    parent_id: Option<&str>,
    label: &str,
    context: Option<&str>,
) -> Result<AddChild> {
    let parent_idx = match parent_id {
        Some(pid) => match find(structure, pid) {
            Some(idx) => Some(idx),
            None => bail!("unknown parent node: {pid}"),
        },
        None => None,
    };

    let node_id = uuid::Uuid::new_v4().to_string();
    let mut node = ChatNode::new(node_id.clone(), label, parent_id.map(str::to_string));
    node.node_type = Some(NodeType::Topic);
    structure.push(node);
    if let Some(idx) = parent_idx {
        structure[idx].children.push(node_id.clone());
    }

    let seed = context.map(|text| Message {
        id: timestamp_id(),
        sender: Sender::Partner,
        text: text.to_string(),
        timestamp: chrono::Local::now().format("%H:%M").to_string(),
        reply_to: None,
        reactions: Default::default(),
        node_id: Some(node_id.clone()),
    });

    Ok(AddChild { node_id, seed })
}

/// A node is hidden iff any strict ancestor is collapsed. Collapsing a
/// node hides its descendants, never the node itself. Dangling parent
/// links degrade to visible.
pub fn is_hidden(structure: &[ChatNode], node_id: &str) -> bool {
    let Some(node) = structure.iter().find(|n| n.id == node_id) else {
        return false;
    };
    let Some(parent_id) = node.parent_id.as_deref() else {
        return false;
    };
    match structure.iter().find(|n| n.id == parent_id) {
        Some(parent) => parent.is_collapsed || is_hidden(structure, &parent.id),
        None => false,
    }
}

/// Ids of the forest roots, in structure order.
pub fn roots(structure: &[ChatNode]) -> Vec<&str> {
    structure
        .iter()
        .filter(|n| n.parent_id.is_none())
        .map(|n| n.id.as_str())
        .collect()
}

/// Persist a user-dragged position; once set the node is never
/// auto-laid-out again.
pub fn set_position(structure: &mut [ChatNode], node_id: &str, position: Position) -> bool {
    match structure.iter_mut().find(|n| n.id == node_id) {
        Some(node) => {
            node.position = Some(position);
            true
        }
        None => false,
    }
}

/// The message partition for the active node. `None` — and master-typed
/// nodes — select the master conversation (messages with no node id).
pub fn visible_messages<'a>(
    messages: &'a [Message],
    structure: &[ChatNode],
    active_node_id: Option<&str>,
) -> Vec<&'a Message> {
    let partition = active_node_id.filter(|id| {
        structure
            .iter()
            .find(|n| n.id == *id)
            .map(|n| n.node_type != Some(NodeType::Master))
            .unwrap_or(true)
    });
    messages
        .iter()
        .filter(|m| m.node_id.as_deref() == partition)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, parent: Option<&str>) -> ChatNode {
        ChatNode::new(id, id.to_uppercase(), parent.map(str::to_string))
    }

    fn assert_children_consistent(structure: &[ChatNode]) {
        for parent in structure {
            let expected: Vec<&str> = structure
                .iter()
                .filter(|n| n.parent_id.as_deref() == Some(parent.id.as_str()))
                .map(|n| n.id.as_str())
                .collect();
            let actual: Vec<&str> = parent.children.iter().map(String::as_str).collect();
            assert_eq!(actual, expected, "children out of sync for {}", parent.id);
        }
    }

    #[test]
    fn test_add_child_keeps_children_consistent() {
        let mut structure = Vec::new();
        let root = add_child(&mut structure, None, "Root", None).unwrap();
        let a = add_child(&mut structure, Some(&root.node_id), "A", None).unwrap();
        add_child(&mut structure, Some(&a.node_id), "B", None).unwrap();
        add_child(&mut structure, Some(&root.node_id), "C", None).unwrap();
        assert_children_consistent(&structure);
    }

    #[test]
    fn test_add_child_dangling_parent_mutates_nothing() {
        let mut structure = vec![node("r", None)];
        let err = add_child(&mut structure, Some("missing"), "X", None);
        assert!(err.is_err());
        assert_eq!(structure.len(), 1);
        assert!(structure[0].children.is_empty());
    }

    #[test]
    fn test_add_child_seed_message_lands_in_new_partition() {
        let mut structure = Vec::new();
        let root = add_child(&mut structure, None, "Root", None).unwrap();
        let child = add_child(&mut structure, Some(&root.node_id), "A", Some("inherited")).unwrap();
        let seed = child.seed.unwrap();
        assert_eq!(seed.node_id.as_deref(), Some(child.node_id.as_str()));
        assert_eq!(seed.sender, Sender::Partner);
        assert_eq!(seed.text, "inherited");
        assert!(root.seed.is_none());
    }

    #[test]
    fn test_collapse_hides_descendants_not_self() {
        let mut structure = Vec::new();
        let r = add_child(&mut structure, None, "R", None).unwrap();
        let a = add_child(&mut structure, Some(&r.node_id), "A", None).unwrap();
        let b = add_child(&mut structure, Some(&a.node_id), "B", None).unwrap();

        assert!(toggle_collapse(&mut structure, &a.node_id));
        assert!(!is_hidden(&structure, &a.node_id));
        assert!(is_hidden(&structure, &b.node_id));
        assert!(!is_hidden(&structure, &r.node_id));

        // Collapsing an ancestor hides the whole subtree
        toggle_collapse(&mut structure, &r.node_id);
        assert!(is_hidden(&structure, &a.node_id));
        assert!(is_hidden(&structure, &b.node_id));
    }

    #[test]
    fn test_hidden_tolerates_dangling_parent() {
        let structure = vec![node("orphan", Some("gone"))];
        assert!(!is_hidden(&structure, "orphan"));
    }

    #[test]
    fn test_visible_messages_partitions_by_node() {
        let structure = vec![node("n1", None)];
        let master = Message {
            id: "1".into(),
            sender: Sender::Me,
            text: "master".into(),
            timestamp: "09:00".into(),
            reply_to: None,
            reactions: Default::default(),
            node_id: None,
        };
        let branch = Message {
            node_id: Some("n1".into()),
            id: "2".into(),
            text: "branch".into(),
            ..master.clone()
        };
        let messages = vec![master, branch];

        let shown = visible_messages(&messages, &structure, None);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].text, "master");

        let shown = visible_messages(&messages, &structure, Some("n1"));
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].text, "branch");
    }

    #[test]
    fn test_master_typed_node_selects_master_partition() {
        let mut master_node = node("m", None);
        master_node.node_type = Some(NodeType::Master);
        let structure = vec![master_node];
        let messages = vec![Message {
            id: "1".into(),
            sender: Sender::Me,
            text: "master".into(),
            timestamp: "09:00".into(),
            reply_to: None,
            reactions: Default::default(),
            node_id: None,
        }];
        let shown = visible_messages(&messages, &structure, Some("m"));
        assert_eq!(shown.len(), 1);
    }
}
