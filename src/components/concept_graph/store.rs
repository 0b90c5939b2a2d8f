//! Incremental merge of extracted concept events into the canonical graph.

use std::collections::VecDeque;

use log::{debug, warn};
use serde_json::Value;

use super::config::{CONTEXTUAL_LINK_STRENGTH, IMPORTANCE_CAP, MERGE_GROWTH, STRENGTH_CAP};
use super::error::{GraphError, Result};
use super::types::{
	ConceptEvent, Graph, GraphLink, GraphNode, MergeContext, RelationshipEvent, UpdateEvent,
};

const DEFAULT_IMPORTANCE: f64 = 1.0;

/// Fold `event` into a copy of `graph`.
///
/// Concepts are merged before relationships so a relationship may reference a
/// concept introduced in the same batch. Growth through repeated mentions is
/// capped; values supplied at creation are stored as given.
pub fn apply_update(graph: &Graph, event: &UpdateEvent, ctx: &MergeContext) -> Graph {
	let mut next = graph.clone();

	for concept in &event.concepts {
		merge_concept(&mut next, concept, ctx);
	}
	for rel in &event.relationships {
		merge_relationship(&mut next, rel);
	}
	next
}

fn merge_concept(graph: &mut Graph, concept: &ConceptEvent, ctx: &MergeContext) {
	if let Some(node) = graph.node_mut(&concept.id) {
		node.importance = (node.importance + concept.importance * MERGE_GROWTH).min(IMPORTANCE_CAP);
		return;
	}

	graph.insert_node(GraphNode {
		id: concept.id.clone(),
		label: concept.label.clone(),
		importance: concept.importance,
	});

	let Some(focus) = ctx.focused_node_id.as_deref() else {
		return;
	};
	if focus == concept.id || graph.link_between(focus, &concept.id).is_some() {
		return;
	}
	if graph.insert_link(GraphLink {
		source: focus.to_owned(),
		target: concept.id.clone(),
		strength: CONTEXTUAL_LINK_STRENGTH,
	}) {
		debug!("contextual link {} -> {}", focus, concept.id);
	}
}

fn merge_relationship(graph: &mut Graph, rel: &RelationshipEvent) {
	if !graph.contains_node(&rel.source_id) || !graph.contains_node(&rel.target_id) {
		debug!(
			"dropping relationship {} -> {}: unknown endpoint",
			rel.source_id, rel.target_id
		);
		return;
	}
	if let Some(link) = graph.link_between_mut(&rel.source_id, &rel.target_id) {
		link.strength = (link.strength + rel.strength * MERGE_GROWTH).min(STRENGTH_CAP);
		return;
	}
	graph.insert_link(GraphLink {
		source: rel.source_id.clone(),
		target: rel.target_id.clone(),
		strength: rel.strength,
	});
}

impl UpdateEvent {
	/// Parse the extractor's JSON payload, skipping malformed entries one by
	/// one. Only a payload that is not an object at all is an error.
	pub fn from_json(raw: &str) -> Result<Self> {
		let value: Value =
			serde_json::from_str(raw).map_err(|e| GraphError::MalformedEvent(e.to_string()))?;
		let Value::Object(map) = value else {
			return Err(GraphError::MalformedEvent("payload is not an object".into()));
		};

		let concepts = entries(map.get("concepts"))
			.filter_map(|entry| {
				let parsed = parse_concept(entry);
				if parsed.is_none() {
					warn!("skipping malformed concept: {}", entry);
				}
				parsed
			})
			.collect();
		let relationships = entries(map.get("relationships"))
			.filter_map(|entry| {
				let parsed = parse_relationship(entry);
				if parsed.is_none() {
					warn!("skipping malformed relationship: {}", entry);
				}
				parsed
			})
			.collect();

		Ok(Self {
			concepts,
			relationships,
		})
	}
}

fn entries(value: Option<&Value>) -> impl Iterator<Item = &Value> {
	value
		.and_then(Value::as_array)
		.into_iter()
		.flat_map(|items| items.iter())
}

fn parse_concept(entry: &Value) -> Option<ConceptEvent> {
	let id = entry.get("id")?.as_str()?;
	let label = entry.get("label")?.as_str()?;
	if id.is_empty() {
		return None;
	}
	let importance = match entry.get("importance") {
		None | Some(Value::Null) => DEFAULT_IMPORTANCE,
		Some(v) => v.as_f64()?,
	};
	Some(ConceptEvent {
		id: id.to_owned(),
		label: label.to_owned(),
		importance,
	})
}

fn parse_relationship(entry: &Value) -> Option<RelationshipEvent> {
	Some(RelationshipEvent {
		source_id: entry.get("sourceId")?.as_str()?.to_owned(),
		target_id: entry.get("targetId")?.as_str()?.to_owned(),
		strength: entry.get("strength")?.as_f64()?,
	})
}

/// Single-consumer FIFO of pending updates. Events are applied strictly in
/// the order they were pushed.
#[derive(Debug, Default)]
pub struct UpdateQueue {
	pending: VecDeque<UpdateEvent>,
}

impl UpdateQueue {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, event: UpdateEvent) {
		self.pending.push_back(event);
	}

	pub fn len(&self) -> usize {
		self.pending.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}

	/// Apply every pending event in arrival order. `focus` is re-read before
	/// each event so a focus change between events is honoured. Returns the
	/// number of events applied.
	pub fn drain_into(
		&mut self,
		graph: &mut Graph,
		mut focus: impl FnMut(&Graph) -> Option<String>,
	) -> usize {
		let mut applied = 0;
		while let Some(event) = self.pending.pop_front() {
			let ctx = MergeContext {
				focused_node_id: focus(&*graph),
			};
			*graph = apply_update(&*graph, &event, &ctx);
			applied += 1;
		}
		applied
	}
}
