//! Session lifetime: the graph, its pending updates, and snapshot export.

use log::{info, warn};
use uuid::Uuid;

use super::error::Result;
use super::store::UpdateQueue;
use super::types::{Graph, GraphLink, GraphNode, SessionSnapshot, SnapshotGraph, UpdateEvent};

pub struct Session {
	id: String,
	graph: Graph,
	queue: UpdateQueue,
}

impl Default for Session {
	fn default() -> Self {
		Self::new()
	}
}

impl Session {
	pub fn new() -> Self {
		Self {
			id: Uuid::new_v4().to_string(),
			graph: Graph::new(),
			queue: UpdateQueue::new(),
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	pub fn enqueue(&mut self, event: UpdateEvent) {
		self.queue.push(event);
	}

	pub fn pending(&self) -> usize {
		self.queue.len()
	}

	/// Merge every queued event in arrival order. `focus` supplies the focused
	/// node before each merge.
	pub fn apply_pending(&mut self, focus: impl FnMut(&Graph) -> Option<String>) -> usize {
		let applied = self.queue.drain_into(&mut self.graph, focus);
		if applied > 0 {
			info!(
				"applied {} update(s): {} nodes, {} links",
				applied,
				self.graph.nodes().len(),
				self.graph.links().len()
			);
		}
		applied
	}

	/// Start over with an empty graph under a fresh id.
	pub fn reset(&mut self) {
		*self = Self::new();
		info!("new session {}", self.id);
	}

	pub fn snapshot(&self, transcript: &str, timestamp_ms: f64) -> SessionSnapshot {
		SessionSnapshot {
			id: self.id.clone(),
			timestamp: timestamp_ms,
			transcript: transcript.to_owned(),
			graph: SnapshotGraph::from(&self.graph),
		}
	}

	pub fn export_json(&self, transcript: &str, timestamp_ms: f64) -> Result<String> {
		Ok(serde_json::to_string(&self.snapshot(transcript, timestamp_ms))?)
	}

	/// Rebuild a session from an exported snapshot. Duplicate nodes keep the
	/// first entry; links whose endpoints are missing are dropped.
	pub fn restore(snapshot: &SessionSnapshot) -> Self {
		let mut graph = Graph::new();
		for node in &snapshot.graph.nodes {
			if graph.contains_node(&node.id) {
				warn!("snapshot {} repeats node {}", snapshot.id, node.id);
				continue;
			}
			graph.insert_node(GraphNode {
				id: node.id.clone(),
				label: node.label.clone(),
				importance: node.val,
			});
		}
		for link in &snapshot.graph.links {
			let inserted = graph.insert_link(GraphLink {
				source: link.source.clone(),
				target: link.target.clone(),
				strength: link.value,
			});
			if !inserted {
				warn!(
					"snapshot {} link {} -> {} dropped",
					snapshot.id, link.source, link.target
				);
			}
		}
		Self {
			id: snapshot.id.clone(),
			graph,
			queue: UpdateQueue::new(),
		}
	}

	pub fn import_json(raw: &str) -> Result<Self> {
		let snapshot: SessionSnapshot = serde_json::from_str(raw)?;
		Ok(Self::restore(&snapshot))
	}
}
