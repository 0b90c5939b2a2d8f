//! Retained visual state reconciled against the graph by explicit
//! enter/update/exit diffs.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use super::types::{Graph, PairKey, pair_key};

pub const NODE_RADIUS: f64 = 5.0;
const FADE_SPEED: f64 = 4.0;
const RADIUS_SPEED: f64 = 6.0;
const SETTLE_EPSILON: f64 = 0.01;

/// Node radius on screen for a given importance.
pub fn node_radius(importance: f64) -> f64 {
	NODE_RADIUS + importance.max(0.0).sqrt() * 3.0
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diff<K> {
	pub entered: Vec<K>,
	pub updated: Vec<K>,
	pub exited: Vec<K>,
}

impl<K> Diff<K> {
	pub fn is_structural(&self) -> bool {
		!self.entered.is_empty() || !self.exited.is_empty()
	}
}

/// Split `next` against `previous`. Entered and updated keep `next`'s order;
/// exited keeps `previous`'s order.
pub fn diff_keys<K: Eq + Hash + Clone>(previous: &[K], next: &[K]) -> Diff<K> {
	let before: HashSet<&K> = previous.iter().collect();
	let after: HashSet<&K> = next.iter().collect();
	let (entered, updated): (Vec<K>, Vec<K>) =
		next.iter().cloned().partition(|k| !before.contains(k));
	Diff {
		entered,
		updated,
		exited: previous
			.iter()
			.filter(|k| !after.contains(k))
			.cloned()
			.collect(),
	}
}

/// Value eased exponentially towards a target each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
	pub value: f64,
	pub target: f64,
}

impl Tween {
	pub fn new(value: f64, target: f64) -> Self {
		Self { value, target }
	}

	pub fn advance(&mut self, speed: f64, dt: f64) {
		self.value += (self.target - self.value) * (speed * dt).min(1.0);
		if (self.target - self.value).abs() < SETTLE_EPSILON {
			self.value = self.target;
		}
	}

	pub fn is_settled(&self) -> bool {
		self.value == self.target
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualNode {
	pub radius: Tween,
	pub opacity: Tween,
	pub exiting: bool,
	/// Last seen layout position, kept so an exiting node can fade in place.
	pub position: Option<(f64, f64)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualLink {
	pub source: String,
	pub target: String,
	pub opacity: Tween,
	pub exiting: bool,
}

/// Visual attributes that outlive a single frame: radius and opacity per
/// node, opacity per link. Exiting entries fade out before they are dropped.
#[derive(Debug, Default)]
pub struct VisualState {
	node_order: Vec<String>,
	link_order: Vec<PairKey>,
	nodes: HashMap<String, VisualNode>,
	links: HashMap<PairKey, VisualLink>,
}

impl VisualState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn node(&self, id: &str) -> Option<&VisualNode> {
		self.nodes.get(id)
	}

	pub fn links(&self) -> impl Iterator<Item = &VisualLink> {
		self.links.values()
	}

	pub fn nodes(&self) -> impl Iterator<Item = (&str, &VisualNode)> {
		self.nodes.iter().map(|(id, node)| (id.as_str(), node))
	}

	/// Diff `graph` against the previous frame and retarget attributes.
	/// Returns the node diff.
	pub fn reconcile(&mut self, graph: &Graph) -> Diff<String> {
		let next_nodes: Vec<String> = graph.nodes().iter().map(|n| n.id.clone()).collect();
		let node_diff = diff_keys(&self.node_order, &next_nodes);

		for id in &node_diff.entered {
			let radius = graph.node(id).map_or(NODE_RADIUS, |n| node_radius(n.importance));
			self.nodes.insert(
				id.clone(),
				VisualNode {
					radius: Tween::new(0.0, radius),
					opacity: Tween::new(0.0, 1.0),
					exiting: false,
					position: None,
				},
			);
		}
		for id in &node_diff.updated {
			if let (Some(visual), Some(node)) = (self.nodes.get_mut(id), graph.node(id)) {
				visual.radius.target = node_radius(node.importance);
			}
		}
		for id in &node_diff.exited {
			if let Some(visual) = self.nodes.get_mut(id) {
				visual.opacity.target = 0.0;
				visual.exiting = true;
			}
		}
		self.node_order = next_nodes;

		let next_links: Vec<PairKey> = graph
			.links()
			.iter()
			.map(|l| pair_key(&l.source, &l.target))
			.collect();
		let link_diff = diff_keys(&self.link_order, &next_links);
		for link in graph.links() {
			let key = pair_key(&link.source, &link.target);
			let visual = self.links.entry(key).or_insert_with(|| VisualLink {
				source: link.source.clone(),
				target: link.target.clone(),
				opacity: Tween::new(0.0, 1.0),
				exiting: false,
			});
			// re-entered while still fading out
			visual.exiting = false;
			visual.opacity.target = 1.0;
		}
		for key in &link_diff.exited {
			if let Some(visual) = self.links.get_mut(key) {
				visual.opacity.target = 0.0;
				visual.exiting = true;
			}
		}
		self.link_order = next_links;

		node_diff
	}

	pub fn track<'a>(&mut self, positions: impl IntoIterator<Item = (&'a str, (f64, f64))>) {
		for (id, pos) in positions {
			if let Some(visual) = self.nodes.get_mut(id) {
				visual.position = Some(pos);
			}
		}
	}

	/// Step every tween; drop exiting entries once they have faded out.
	pub fn advance(&mut self, dt: f64) {
		for visual in self.nodes.values_mut() {
			visual.radius.advance(RADIUS_SPEED, dt);
			visual.opacity.advance(FADE_SPEED, dt);
		}
		for visual in self.links.values_mut() {
			visual.opacity.advance(FADE_SPEED, dt);
		}
		self.nodes
			.retain(|_, v| !(v.exiting && v.opacity.is_settled()));
		self.links
			.retain(|_, v| !(v.exiting && v.opacity.is_settled()));
	}

	pub fn is_animating(&self) -> bool {
		self.nodes
			.values()
			.any(|v| !v.radius.is_settled() || !v.opacity.is_settled())
			|| self.links.values().any(|v| !v.opacity.is_settled())
	}
}
