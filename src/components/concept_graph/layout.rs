//! Continuous force relaxation over the graph's node set.
//!
//! One integrator composes link springs, many-body charge, collision and a
//! positional pull. Which parameters it uses comes from [`LayoutMode`]; the
//! mode is swapped, never patched in place. Energy (`alpha`) decays every tick
//! and any structural, mode or focus change reheats it to 1 while keeping each
//! node's last position as its seed.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use super::types::{Graph, PairKey, Viewport, pair_key};

const ALPHA_MIN: f64 = 0.001;
const VELOCITY_DECAY: f64 = 0.4;
const DISTANCE_MIN_SQ: f64 = 1.0;
const SEED_RADIUS: f64 = 10.0;
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Force configuration selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
	#[default]
	Network,
	Stream,
	Layers,
	Cluster,
}

impl LayoutMode {
	pub const ALL: [LayoutMode; 4] = [
		LayoutMode::Network,
		LayoutMode::Stream,
		LayoutMode::Layers,
		LayoutMode::Cluster,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			LayoutMode::Network => "network",
			LayoutMode::Stream => "stream",
			LayoutMode::Layers => "layers",
			LayoutMode::Cluster => "cluster",
		}
	}

	/// How links are drawn in this mode. Hit-testing always uses node centres.
	pub fn link_shape(self) -> LinkShape {
		match self {
			LayoutMode::Stream => LinkShape::Curved,
			_ => LinkShape::Straight,
		}
	}
}

impl fmt::Display for LayoutMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for LayoutMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		LayoutMode::ALL
			.into_iter()
			.find(|mode| mode.as_str() == s)
			.ok_or_else(|| format!("unknown layout mode `{s}`"))
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkShape {
	Straight,
	Curved,
}

/// Collision radius as a function of importance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CollisionRule {
	Fixed(f64),
	/// `max(min, importance * scale + offset)`
	Importance { scale: f64, offset: f64, min: f64 },
}

impl CollisionRule {
	pub fn radius(self, importance: f64) -> f64 {
		match self {
			CollisionRule::Fixed(r) => r,
			CollisionRule::Importance { scale, offset, min } => (importance * scale + offset).max(min),
		}
	}
}

/// Target and strength of a pull along one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisPull {
	pub target: f64,
	pub strength: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PositionalPull {
	pub x: Option<AxisPull>,
	pub y: Option<AxisPull>,
}

/// Parameters of one force configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModeForces {
	pub mode: LayoutMode,
	pub link_distance: f64,
	/// `None` uses the degree-based default `1 / min(deg(source), deg(target))`.
	pub link_strength: Option<f64>,
	pub charge: f64,
	pub collision: CollisionRule,
	pub collision_strength: f64,
}

impl ModeForces {
	pub fn for_mode(mode: LayoutMode, focused: bool) -> Self {
		match mode {
			LayoutMode::Network => Self {
				mode,
				link_distance: if focused { 200.0 } else { 150.0 },
				link_strength: None,
				charge: if focused { -800.0 } else { -500.0 },
				collision: CollisionRule::Importance {
					scale: 4.0,
					offset: 0.0,
					min: 30.0,
				},
				collision_strength: 1.0,
			},
			LayoutMode::Stream => Self {
				mode,
				link_distance: 80.0,
				link_strength: Some(0.5),
				charge: -100.0,
				collision: CollisionRule::Fixed(30.0),
				collision_strength: 1.0,
			},
			LayoutMode::Layers => Self {
				mode,
				link_distance: 100.0,
				link_strength: Some(0.1),
				charge: -200.0,
				collision: CollisionRule::Fixed(40.0),
				collision_strength: 1.0,
			},
			LayoutMode::Cluster => Self {
				mode,
				link_distance: 30.0,
				link_strength: Some(0.01),
				charge: -10.0,
				collision: CollisionRule::Importance {
					scale: 4.0,
					offset: 15.0,
					min: 0.0,
				},
				collision_strength: 0.9,
			},
		}
	}

	pub fn collision_radius(&self, importance: f64) -> f64 {
		self.collision.radius(importance)
	}

	/// Positional pull on the node at arrival `index` of `count` nodes.
	pub fn pull(&self, importance: f64, index: usize, count: usize, viewport: Viewport) -> PositionalPull {
		let axis = |target, strength| Some(AxisPull { target, strength });
		match self.mode {
			LayoutMode::Network => PositionalPull {
				x: axis(0.0, 0.05),
				y: axis(0.0, 0.05),
			},
			LayoutMode::Stream => {
				let w = viewport.width;
				let x = if count > 1 {
					-w / 2.5 + (index as f64 / (count - 1) as f64) * 0.8 * w
				} else {
					0.0
				};
				PositionalPull {
					x: axis(x, 2.0),
					y: axis(0.0, 0.1),
				}
			}
			LayoutMode::Layers => {
				let h = viewport.height;
				let y = if importance > 7.0 {
					-h / 3.0
				} else if importance > 4.0 {
					0.0
				} else {
					h / 3.0
				};
				PositionalPull {
					x: None,
					y: axis(y, 1.5),
				}
			}
			LayoutMode::Cluster => PositionalPull {
				x: axis(0.0, 0.2),
				y: axis(0.0, 0.2),
			},
		}
	}
}

#[derive(Clone, Debug)]
struct SimNode {
	id: String,
	importance: f64,
	x: f64,
	y: f64,
	vx: f64,
	vy: f64,
	pinned: Option<(f64, f64)>,
	/// Set once the node has been through at least one integration step.
	placed: bool,
}

/// Force-directed layout over the current graph.
pub struct LayoutEngine {
	nodes: Vec<SimNode>,
	index: HashMap<String, usize>,
	links: Vec<(usize, usize)>,
	link_keys: HashSet<PairKey>,
	forces: ModeForces,
	focus: Option<String>,
	viewport: Viewport,
	alpha: f64,
	alpha_decay: f64,
	jiggle_seed: u64,
}

impl LayoutEngine {
	pub fn new(viewport: Viewport) -> Self {
		Self {
			nodes: Vec::new(),
			index: HashMap::new(),
			links: Vec::new(),
			link_keys: HashSet::new(),
			forces: ModeForces::for_mode(LayoutMode::default(), false),
			focus: None,
			viewport,
			alpha: 1.0,
			alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / 300.0),
			jiggle_seed: 1,
		}
	}

	pub fn mode(&self) -> LayoutMode {
		self.forces.mode
	}

	pub fn forces(&self) -> &ModeForces {
		&self.forces
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn is_running(&self) -> bool {
		self.alpha >= ALPHA_MIN
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Restart at full energy. Positions are kept as seeds.
	pub fn reheat(&mut self) {
		self.alpha = 1.0;
	}

	pub fn set_mode(&mut self, mode: LayoutMode) {
		if mode == self.forces.mode {
			return;
		}
		debug!("layout mode {} -> {}", self.forces.mode, mode);
		self.forces = ModeForces::for_mode(mode, self.focus.is_some());
		self.reheat();
	}

	/// Switch to the focused (or unfocused) parameters of the current mode.
	/// Moving focus from one node to another also reheats.
	pub fn set_focus(&mut self, focus: Option<&str>) {
		if focus == self.focus.as_deref() {
			return;
		}
		self.focus = focus.map(str::to_owned);
		self.forces = ModeForces::for_mode(self.forces.mode, self.focus.is_some());
		self.reheat();
	}

	pub fn set_viewport(&mut self, viewport: Viewport) {
		self.viewport = viewport;
	}

	/// Bring the simulated node/link set in line with `graph`. Existing nodes
	/// keep position and velocity; new nodes are seeded next to a linked
	/// neighbour or on a spiral around the origin. Reheats when the set of ids
	/// or link pairs changed.
	pub fn sync(&mut self, graph: &Graph) {
		let mut previous: HashMap<String, SimNode> = self
			.nodes
			.drain(..)
			.map(|node| (node.id.clone(), node))
			.collect();
		let mut changed = previous.len() != graph.nodes().len();

		self.index.clear();
		let mut fresh = Vec::new();
		for (i, node) in graph.nodes().iter().enumerate() {
			let sim = match previous.remove(&node.id) {
				Some(mut sim) => {
					sim.importance = node.importance;
					sim
				}
				None => {
					changed = true;
					fresh.push(i);
					SimNode {
						id: node.id.clone(),
						importance: node.importance,
						x: 0.0,
						y: 0.0,
						vx: 0.0,
						vy: 0.0,
						pinned: None,
						placed: false,
					}
				}
			};
			self.index.insert(node.id.clone(), i);
			self.nodes.push(sim);
		}
		changed |= !previous.is_empty();

		let link_keys: HashSet<PairKey> = graph
			.links()
			.iter()
			.map(|l| pair_key(&l.source, &l.target))
			.collect();
		changed |= link_keys != self.link_keys;
		self.link_keys = link_keys;
		self.links = graph
			.links()
			.iter()
			.filter_map(|l| Some((*self.index.get(&l.source)?, *self.index.get(&l.target)?)))
			.collect();

		for i in fresh {
			let (x, y) = self.seed_position(i, graph);
			let node = &mut self.nodes[i];
			node.x = x;
			node.y = y;
		}

		if changed {
			debug!(
				"layout resynced: {} nodes, {} links",
				self.nodes.len(),
				self.links.len()
			);
			self.reheat();
		}
	}

	fn seed_position(&self, i: usize, graph: &Graph) -> (f64, f64) {
		let id = self.nodes[i].id.as_str();
		let anchor = graph
			.neighbors(id)
			.filter_map(|n| self.index.get(n).map(|&j| &self.nodes[j]))
			.find(|n| n.placed || n.pinned.is_some())
			.map(|n| (n.x, n.y));
		let angle = i as f64 * GOLDEN_ANGLE;
		match anchor {
			Some((ax, ay)) => (ax + SEED_RADIUS * angle.cos(), ay + SEED_RADIUS * angle.sin()),
			None => {
				let radius = SEED_RADIUS * (0.5 + i as f64).sqrt();
				(radius * angle.cos(), radius * angle.sin())
			}
		}
	}

	/// Last integrated position, `None` until the node has been ticked once.
	pub fn position(&self, id: &str) -> Option<(f64, f64)> {
		let node = &self.nodes[*self.index.get(id)?];
		if let Some(pin) = node.pinned {
			return Some(pin);
		}
		node.placed.then_some((node.x, node.y))
	}

	/// `(id, position)` for every node that has a known position.
	pub fn positions(&self) -> impl Iterator<Item = (&str, (f64, f64))> + '_ {
		self.nodes
			.iter()
			.filter_map(|n| self.position(&n.id).map(|p| (n.id.as_str(), p)))
	}

	/// Hold `id` at `(x, y)` until [`LayoutEngine::unpin`].
	pub fn pin(&mut self, id: &str, x: f64, y: f64) {
		if let Some(&i) = self.index.get(id) {
			let node = &mut self.nodes[i];
			node.pinned = Some((x, y));
			node.x = x;
			node.y = y;
			node.vx = 0.0;
			node.vy = 0.0;
			node.placed = true;
			self.reheat();
		}
	}

	pub fn unpin(&mut self, id: &str) {
		if let Some(&i) = self.index.get(id) {
			self.nodes[i].pinned = None;
		}
	}

	pub fn is_pinned(&self, id: &str) -> bool {
		self.index
			.get(id)
			.is_some_and(|&i| self.nodes[i].pinned.is_some())
	}

	/// One integration step. Returns whether the simulation is still moving.
	pub fn tick(&mut self) -> bool {
		if self.nodes.is_empty() || !self.is_running() {
			return false;
		}
		self.alpha += (0.0 - self.alpha) * self.alpha_decay;

		self.apply_links();
		self.apply_charge();
		self.apply_collision();
		self.apply_pull();

		for node in &mut self.nodes {
			node.placed = true;
			if let Some((px, py)) = node.pinned {
				node.x = px;
				node.y = py;
				node.vx = 0.0;
				node.vy = 0.0;
				continue;
			}
			node.vx *= 1.0 - VELOCITY_DECAY;
			node.vy *= 1.0 - VELOCITY_DECAY;
			node.x += node.vx;
			node.y += node.vy;
		}
		self.is_running()
	}

	fn jiggle(&mut self) -> f64 {
		self.jiggle_seed = (self.jiggle_seed * 9301 + 49297) % 233280;
		(self.jiggle_seed as f64 / 233280.0 - 0.5) * 1e-6
	}

	fn apply_links(&mut self) {
		let mut degree = vec![0usize; self.nodes.len()];
		for &(s, t) in &self.links {
			degree[s] += 1;
			degree[t] += 1;
		}
		let links = self.links.clone();
		for (s, t) in links {
			if s == t {
				continue;
			}
			let strength = self
				.forces
				.link_strength
				.unwrap_or_else(|| 1.0 / degree[s].min(degree[t]) as f64);
			let bias = degree[s] as f64 / (degree[s] + degree[t]) as f64;

			let (src, tgt) = (&self.nodes[s], &self.nodes[t]);
			let mut dx = tgt.x + tgt.vx - src.x - src.vx;
			let mut dy = tgt.y + tgt.vy - src.y - src.vy;
			if dx == 0.0 {
				dx = self.jiggle();
			}
			if dy == 0.0 {
				dy = self.jiggle();
			}
			let dist = (dx * dx + dy * dy).sqrt();
			let l = (dist - self.forces.link_distance) / dist * self.alpha * strength;
			let (fx, fy) = (dx * l, dy * l);

			let tgt = &mut self.nodes[t];
			tgt.vx -= fx * bias;
			tgt.vy -= fy * bias;
			let src = &mut self.nodes[s];
			src.vx += fx * (1.0 - bias);
			src.vy += fy * (1.0 - bias);
		}
	}

	fn apply_charge(&mut self) {
		let n = self.nodes.len();
		let k = self.forces.charge * self.alpha;
		for i in 0..n {
			for j in (i + 1)..n {
				let mut dx = self.nodes[j].x - self.nodes[i].x;
				let mut dy = self.nodes[j].y - self.nodes[i].y;
				let mut l2 = dx * dx + dy * dy;
				if l2 == 0.0 {
					dx = self.jiggle();
					dy = self.jiggle();
					l2 = dx * dx + dy * dy;
				}
				if l2 < DISTANCE_MIN_SQ {
					l2 = (DISTANCE_MIN_SQ * l2).sqrt();
				}
				let (fx, fy) = (dx * k / l2, dy * k / l2);
				self.nodes[i].vx += fx;
				self.nodes[i].vy += fy;
				self.nodes[j].vx -= fx;
				self.nodes[j].vy -= fy;
			}
		}
	}

	fn apply_collision(&mut self) {
		let n = self.nodes.len();
		let radii: Vec<f64> = self
			.nodes
			.iter()
			.map(|node| self.forces.collision_radius(node.importance))
			.collect();
		for i in 0..n {
			for j in (i + 1)..n {
				let r = radii[i] + radii[j];
				let (a, b) = (&self.nodes[i], &self.nodes[j]);
				let mut dx = (a.x + a.vx) - (b.x + b.vx);
				let mut dy = (a.y + a.vy) - (b.y + b.vy);
				let mut l2 = dx * dx + dy * dy;
				if l2 >= r * r {
					continue;
				}
				if l2 == 0.0 {
					dx = self.jiggle();
					dy = self.jiggle();
					l2 = dx * dx + dy * dy;
				}
				let l = l2.sqrt();
				let push = (r - l) / l * self.forces.collision_strength;
				let (ri2, rj2) = (radii[i] * radii[i], radii[j] * radii[j]);
				let share = rj2 / (ri2 + rj2);
				self.nodes[i].vx += dx * push * share;
				self.nodes[i].vy += dy * push * share;
				self.nodes[j].vx -= dx * push * (1.0 - share);
				self.nodes[j].vy -= dy * push * (1.0 - share);
			}
		}
	}

	fn apply_pull(&mut self) {
		let count = self.nodes.len();
		let (forces, viewport, alpha) = (self.forces, self.viewport, self.alpha);
		for (i, node) in self.nodes.iter_mut().enumerate() {
			let pull = forces.pull(node.importance, i, count, viewport);
			if let Some(px) = pull.x {
				node.vx += (px.target - node.x) * px.strength * alpha;
			}
			if let Some(py) = pull.y {
				node.vy += (py.target - node.y) * py.strength * alpha;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::super::store::apply_update;
	use super::super::types::{ConceptEvent, MergeContext, RelationshipEvent, UpdateEvent};
	use super::*;

	const VIEW: Viewport = Viewport {
		width: 1000.0,
		height: 600.0,
	};

	fn graph_of(ids: &[(&str, f64)], links: &[(&str, &str)]) -> Graph {
		apply_update(
			&Graph::new(),
			&UpdateEvent {
				concepts: ids
					.iter()
					.map(|&(id, importance)| ConceptEvent {
						id: id.into(),
						label: id.into(),
						importance,
					})
					.collect(),
				relationships: links
					.iter()
					.map(|&(s, t)| RelationshipEvent {
						source_id: s.into(),
						target_id: t.into(),
						strength: 1.0,
					})
					.collect(),
			},
			&MergeContext::default(),
		)
	}

	fn distance(engine: &LayoutEngine, a: &str, b: &str) -> f64 {
		let (ax, ay) = engine.position(a).unwrap();
		let (bx, by) = engine.position(b).unwrap();
		((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
	}

	#[test]
	fn mode_table() {
		let network = ModeForces::for_mode(LayoutMode::Network, false);
		assert_eq!(network.link_distance, 150.0);
		assert_eq!(network.charge, -500.0);
		assert_eq!(network.collision_radius(2.0), 30.0);
		assert_eq!(network.collision_radius(10.0), 40.0);

		let focused = ModeForces::for_mode(LayoutMode::Network, true);
		assert_eq!(focused.link_distance, 200.0);
		assert_eq!(focused.charge, -800.0);

		let stream = ModeForces::for_mode(LayoutMode::Stream, false);
		assert_eq!(stream.link_distance, 80.0);
		assert_eq!(stream.link_strength, Some(0.5));
		assert_eq!(stream.charge, -100.0);
		assert_eq!(stream.collision_radius(1.0), 30.0);
		assert_eq!(stream.collision_radius(20.0), 30.0);

		let layers = ModeForces::for_mode(LayoutMode::Layers, false);
		assert_eq!(layers.link_distance, 100.0);
		assert_eq!(layers.link_strength, Some(0.1));
		assert_eq!(layers.charge, -200.0);
		assert_eq!(layers.collision_radius(1.0), 40.0);
		assert_eq!(layers.collision_radius(20.0), 40.0);

		// focus only retunes the network row
		assert_eq!(ModeForces::for_mode(LayoutMode::Stream, true), stream);
		assert_eq!(ModeForces::for_mode(LayoutMode::Layers, true), layers);

		let cluster = ModeForces::for_mode(LayoutMode::Cluster, false);
		assert_eq!(cluster.collision_radius(5.0), 35.0);
		assert_eq!(cluster.collision_strength, 0.9);
		assert_eq!(cluster.link_strength, Some(0.01));
	}

	#[test]
	fn stream_spreads_by_arrival_order() {
		let stream = ModeForces::for_mode(LayoutMode::Stream, false);
		let first = stream.pull(1.0, 0, 3, VIEW).x.unwrap();
		let last = stream.pull(1.0, 2, 3, VIEW).x.unwrap();
		assert_eq!(first.target, -400.0);
		assert_eq!(last.target, 400.0);
		assert_eq!(first.strength, 2.0);
	}

	#[test]
	fn stream_single_node_targets_centre() {
		let stream = ModeForces::for_mode(LayoutMode::Stream, false);
		let pull = stream.pull(1.0, 0, 1, VIEW).x.unwrap();
		assert_eq!(pull.target, 0.0);
		assert!(pull.target.is_finite());
	}

	#[test]
	fn layers_bucket_by_importance() {
		let layers = ModeForces::for_mode(LayoutMode::Layers, false);
		let tier = |importance| layers.pull(importance, 0, 1, VIEW).y.unwrap().target;
		assert_eq!(tier(9.0), -200.0);
		assert_eq!(tier(5.0), 0.0);
		assert_eq!(tier(4.0), 200.0);
		assert!(layers.pull(9.0, 0, 1, VIEW).x.is_none());
	}

	#[test]
	fn mode_parses_from_name() {
		assert_eq!("layers".parse::<LayoutMode>(), Ok(LayoutMode::Layers));
		assert!("radial".parse::<LayoutMode>().is_err());
	}

	#[test]
	fn position_unknown_until_first_tick() {
		let mut engine = LayoutEngine::new(VIEW);
		engine.sync(&graph_of(&[("a", 1.0)], &[]));
		assert_eq!(engine.position("a"), None);
		engine.tick();
		assert!(engine.position("a").is_some());
		assert_eq!(engine.position("missing"), None);
	}

	#[test]
	fn overlapping_nodes_repel() {
		let mut engine = LayoutEngine::new(VIEW);
		engine.sync(&graph_of(&[("a", 1.0), ("b", 1.0)], &[]));
		engine.tick();
		let before = distance(&engine, "a", "b");
		for _ in 0..100 {
			engine.tick();
		}
		assert!(distance(&engine, "a", "b") > before);
	}

	#[test]
	fn reheat_keeps_positions() {
		let mut engine = LayoutEngine::new(VIEW);
		engine.sync(&graph_of(&[("a", 1.0), ("b", 1.0)], &[("a", "b")]));
		for _ in 0..400 {
			engine.tick();
		}
		assert!(!engine.is_running());
		let settled = engine.position("a").unwrap();

		engine.set_mode(LayoutMode::Cluster);
		assert_eq!(engine.alpha(), 1.0);
		assert_eq!(engine.position("a"), Some(settled));
		assert!(engine.tick());
	}

	#[test]
	fn sync_reheats_only_on_structural_change() {
		let mut engine = LayoutEngine::new(VIEW);
		let graph = graph_of(&[("a", 1.0), ("b", 1.0)], &[]);
		engine.sync(&graph);
		for _ in 0..400 {
			engine.tick();
		}
		engine.sync(&graph);
		assert!(!engine.is_running());

		let grown = graph_of(&[("a", 1.0), ("b", 1.0), ("c", 1.0)], &[("a", "c")]);
		let kept = engine.position("a");
		engine.sync(&grown);
		assert!(engine.is_running());
		assert_eq!(engine.position("a"), kept);
	}

	#[test]
	fn focus_change_reheats_with_focused_parameters() {
		let mut engine = LayoutEngine::new(VIEW);
		engine.sync(&graph_of(&[("a", 1.0)], &[]));
		for _ in 0..400 {
			engine.tick();
		}
		engine.set_focus(Some("a"));
		assert_eq!(engine.alpha(), 1.0);
		assert_eq!(engine.forces().link_distance, 200.0);

		for _ in 0..400 {
			engine.tick();
		}
		engine.set_focus(Some("a"));
		assert!(!engine.is_running());
		engine.set_focus(None);
		assert_eq!(engine.forces().charge, -500.0);
		assert!(engine.is_running());
	}

	#[test]
	fn pinned_node_holds_position() {
		let mut engine = LayoutEngine::new(VIEW);
		engine.sync(&graph_of(&[("a", 1.0), ("b", 1.0)], &[("a", "b")]));
		engine.pin("a", 300.0, -120.0);
		for _ in 0..50 {
			engine.tick();
		}
		assert_eq!(engine.position("a"), Some((300.0, -120.0)));

		engine.unpin("a");
		engine.reheat();
		for _ in 0..50 {
			engine.tick();
		}
		assert_ne!(engine.position("a"), Some((300.0, -120.0)));
	}

	#[test]
	fn cluster_pulls_towards_origin() {
		let mut engine = LayoutEngine::new(VIEW);
		engine.set_mode(LayoutMode::Cluster);
		engine.sync(&graph_of(&[("a", 1.0)], &[]));
		engine.pin("a", 500.0, 500.0);
		engine.unpin("a");
		for _ in 0..200 {
			engine.tick();
		}
		let (x, y) = engine.position("a").unwrap();
		assert!(x.abs() < 50.0 && y.abs() < 50.0);
	}

	#[test]
	fn new_node_seeds_next_to_linked_neighbour() {
		let mut engine = LayoutEngine::new(VIEW);
		engine.sync(&graph_of(&[("a", 1.0)], &[]));
		engine.pin("a", 250.0, 250.0);
		engine.sync(&graph_of(&[("a", 1.0), ("b", 1.0)], &[("a", "b")]));
		engine.tick();
		assert!(distance(&engine, "a", "b") < 200.0);
		let (bx, by) = engine.position("b").unwrap();
		assert!(bx > 0.0 && by > 0.0);
	}
}
