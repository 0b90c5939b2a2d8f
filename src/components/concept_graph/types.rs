use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A concept in the graph. Positions are owned by the layout engine and looked
/// up by id, so the node record only carries identity and semantic attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: String,
	pub label: String,
	pub importance: f64,
}

/// A stored link. Endpoints are ids, never node references.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
	pub source: String,
	pub target: String,
	pub strength: f64,
}

/// Key for an unordered node pair: `a -> b` and `b -> a` share one key.
pub type PairKey = (String, String);

pub fn pair_key(a: &str, b: &str) -> PairKey {
	if a <= b {
		(a.to_owned(), b.to_owned())
	} else {
		(b.to_owned(), a.to_owned())
	}
}

/// Canonical node/link state. Nodes keep insertion order, which the stream
/// layout depends on.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	nodes: Vec<GraphNode>,
	node_index: HashMap<String, usize>,
	links: Vec<GraphLink>,
	link_index: HashMap<PairKey, usize>,
}

impl Graph {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	pub fn links(&self) -> &[GraphLink] {
		&self.links
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.node_index.get(id).map(|&idx| &self.nodes[idx])
	}

	pub fn contains_node(&self, id: &str) -> bool {
		self.node_index.contains_key(id)
	}

	/// Position of `id` in arrival order.
	pub fn insertion_index(&self, id: &str) -> Option<usize> {
		self.node_index.get(id).copied()
	}

	/// Link between `a` and `b` in either direction.
	pub fn link_between(&self, a: &str, b: &str) -> Option<&GraphLink> {
		self.link_index
			.get(&pair_key(a, b))
			.map(|&idx| &self.links[idx])
	}

	pub fn neighbors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
		self.links.iter().filter_map(move |link| {
			if link.source == id {
				Some(link.target.as_str())
			} else if link.target == id {
				Some(link.source.as_str())
			} else {
				None
			}
		})
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub(super) fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
		self.node_index
			.get(id)
			.copied()
			.map(move |idx| &mut self.nodes[idx])
	}

	pub(super) fn link_between_mut(&mut self, a: &str, b: &str) -> Option<&mut GraphLink> {
		self.link_index
			.get(&pair_key(a, b))
			.copied()
			.map(move |idx| &mut self.links[idx])
	}

	/// Insert a node. Callers check for an existing id first.
	pub(super) fn insert_node(&mut self, node: GraphNode) {
		debug_assert!(!self.contains_node(&node.id));
		self.node_index.insert(node.id.clone(), self.nodes.len());
		self.nodes.push(node);
	}

	/// Insert a link. Returns `false` (and stores nothing) when an endpoint is
	/// missing or the pair is already linked.
	pub(super) fn insert_link(&mut self, link: GraphLink) -> bool {
		if !self.contains_node(&link.source) || !self.contains_node(&link.target) {
			return false;
		}
		let key = pair_key(&link.source, &link.target);
		if self.link_index.contains_key(&key) {
			return false;
		}
		self.link_index.insert(key, self.links.len());
		self.links.push(link);
		true
	}
}

/// Concept mention from the extraction collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConceptEvent {
	pub id: String,
	pub label: String,
	pub importance: f64,
}

/// Relationship between two concepts from the extraction collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipEvent {
	pub source_id: String,
	pub target_id: String,
	pub strength: f64,
}

/// One batch of extracted concepts and relationships.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateEvent {
	#[serde(default)]
	pub concepts: Vec<ConceptEvent>,
	#[serde(default)]
	pub relationships: Vec<RelationshipEvent>,
}

/// Inputs to a merge besides the graph and the event.
#[derive(Clone, Debug, Default)]
pub struct MergeContext {
	pub focused_node_id: Option<String>,
}

/// Serialized node: `val` is importance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
	pub id: String,
	pub label: String,
	pub val: f64,
}

/// Serialized link: endpoints are plain ids, `value` is strength.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotLink {
	pub source: String,
	pub target: String,
	pub value: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotGraph {
	pub nodes: Vec<SnapshotNode>,
	pub links: Vec<SnapshotLink>,
}

impl From<&Graph> for SnapshotGraph {
	fn from(graph: &Graph) -> Self {
		Self {
			nodes: graph
				.nodes()
				.iter()
				.map(|n| SnapshotNode {
					id: n.id.clone(),
					label: n.label.clone(),
					val: n.importance,
				})
				.collect(),
			links: graph
				.links()
				.iter()
				.map(|l| SnapshotLink {
					source: l.source.clone(),
					target: l.target.clone(),
					value: l.strength,
				})
				.collect(),
		}
	}
}

/// Immutable export of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
	pub id: String,
	/// Epoch milliseconds.
	pub timestamp: f64,
	pub transcript: String,
	pub graph: SnapshotGraph,
}

/// One normalized hand landmark.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
	pub x: f64,
	pub y: f64,
	#[serde(default)]
	pub z: f64,
}

/// 21 landmarks for a single detected hand.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HandLandmarks(pub Vec<Landmark>);

impl HandLandmarks {
	pub const THUMB_TIP: usize = 4;
	pub const INDEX_TIP: usize = 8;

	pub fn thumb_tip(&self) -> Option<Landmark> {
		self.0.get(Self::THUMB_TIP).copied()
	}

	pub fn index_tip(&self) -> Option<Landmark> {
		self.0.get(Self::INDEX_TIP).copied()
	}
}

/// Canvas size in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node(id: &str) -> GraphNode {
		GraphNode {
			id: id.into(),
			label: id.to_uppercase(),
			importance: 1.0,
		}
	}

	#[test]
	fn reverse_link_shares_pair_key() {
		let mut graph = Graph::new();
		graph.insert_node(node("a"));
		graph.insert_node(node("b"));
		assert!(graph.insert_link(GraphLink {
			source: "a".into(),
			target: "b".into(),
			strength: 1.0,
		}));
		assert!(!graph.insert_link(GraphLink {
			source: "b".into(),
			target: "a".into(),
			strength: 1.0,
		}));
		assert_eq!(graph.links().len(), 1);
		assert!(graph.link_between("b", "a").is_some());
	}

	#[test]
	fn link_with_missing_endpoint_is_refused() {
		let mut graph = Graph::new();
		graph.insert_node(node("a"));
		assert!(!graph.insert_link(GraphLink {
			source: "a".into(),
			target: "ghost".into(),
			strength: 1.0,
		}));
		assert!(graph.links().is_empty());
	}

	#[test]
	fn snapshot_uses_wire_names() {
		let mut graph = Graph::new();
		graph.insert_node(node("a"));
		graph.insert_node(node("b"));
		graph.insert_link(GraphLink {
			source: "a".into(),
			target: "b".into(),
			strength: 2.5,
		});
		let json = serde_json::to_value(SnapshotGraph::from(&graph)).unwrap();
		assert_eq!(json["nodes"][0]["val"], 1.0);
		assert_eq!(json["links"][0]["source"], "a");
		assert_eq!(json["links"][0]["value"], 2.5);
	}

	#[test]
	fn relationship_uses_camel_case() {
		let rel: RelationshipEvent =
			serde_json::from_str(r#"{"sourceId":"a","targetId":"b","strength":4}"#).unwrap();
		assert_eq!(rel.source_id, "a");
		assert_eq!(rel.strength, 4.0);
	}
}
