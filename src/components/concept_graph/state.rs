use std::collections::HashSet;

use log::{debug, info, warn};

use super::config::{GraphConfig, clamp_zoom};
use super::focus::FocusController;
use super::gesture::{self, CursorUpdate, GestureEvent, GestureState, GestureThresholds};
use super::hit_test;
use super::layout::{LayoutEngine, LayoutMode};
use super::reconcile::VisualState;
use super::session::Session;
use super::types::{HandLandmarks, SessionSnapshot, UpdateEvent, Viewport};

/// Screen distance a press may travel and still count as a click.
const CLICK_SLOP: f64 = 4.0;

/// Outgoing notifications for the embedding application.
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
	Hover(Option<String>),
	Select(String),
	Deselect,
	/// Global zoom changed from inside the canvas (wheel).
	Zoom(f64),
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node: Option<String>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: (f64, f64),
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<String>,
	pub neighbors: HashSet<String>,
	pub highlight_t: f64,
	pub prev_node: Option<String>,
	pub prev_neighbors: HashSet<String>,
	delay_t: f64,
}

/// Everything one canvas needs between frames.
pub struct ConceptGraphState {
	pub session: Session,
	pub layout: LayoutEngine,
	pub focus: FocusController,
	pub visuals: VisualState,
	pub config: GraphConfig,
	pub drag: DragState,
	pub hover: HoverState,
	pub gesture: GestureState,
	/// Normalized, mirrored index-tip position while a hand is tracked.
	pub gesture_cursor: Option<(f64, f64)>,
	/// Mouse position in canvas pixels.
	pub mouse_cursor: Option<(f64, f64)>,
	pub viewport: Viewport,
	pub flow_time: f64,
	thresholds: GestureThresholds,
	notifications: Vec<Notification>,
}

impl ConceptGraphState {
	pub fn new(config: GraphConfig, width: f64, height: f64) -> Self {
		let viewport = Viewport { width, height };
		Self {
			session: Session::new(),
			layout: LayoutEngine::new(viewport),
			focus: FocusController::new(&config, viewport),
			visuals: VisualState::new(),
			thresholds: GestureThresholds::from(&config),
			config,
			drag: DragState::default(),
			hover: HoverState::default(),
			gesture: GestureState::default(),
			gesture_cursor: None,
			mouse_cursor: None,
			viewport,
			flow_time: 0.0,
			notifications: Vec::new(),
		}
	}

	pub fn enqueue(&mut self, event: UpdateEvent) {
		self.session.enqueue(event);
	}

	/// Merge queued events, then bring layout, visuals and focus in line.
	pub fn apply_pending(&mut self) {
		let focused = self.focus.focused().map(str::to_owned);
		if self.session.apply_pending(|_| focused.clone()) == 0 {
			return;
		}
		self.graph_changed();
	}

	fn graph_changed(&mut self) {
		let graph = self.session.graph();
		self.layout.sync(graph);
		let diff = self.visuals.reconcile(graph);
		if diff.is_structural() {
			debug!(
				"nodes entered: {}, exited: {}",
				diff.entered.len(),
				diff.exited.len()
			);
		}
		if self.focus.validate(graph) {
			self.notifications.push(Notification::Deselect);
			self.focus_changed();
		}
		if let Some(hovered) = self.hover.node.clone() {
			if !self.session.graph().contains_node(&hovered) {
				self.set_hover(None);
			} else {
				self.set_hover(Some(hovered));
			}
		}
	}

	/// Drop the graph and start a new session. Focus is cleared with it.
	pub fn reset(&mut self) {
		self.session.reset();
		self.drag = DragState::default();
		self.graph_changed();
	}

	pub fn snapshot(&self, transcript: &str, timestamp_ms: f64) -> SessionSnapshot {
		self.session.snapshot(transcript, timestamp_ms)
	}

	pub fn set_mode(&mut self, mode: LayoutMode) {
		if mode != self.layout.mode() {
			info!("layout mode -> {}", mode);
			self.layout.set_mode(mode);
		}
	}

	pub fn set_global_zoom(&mut self, zoom: f64) {
		if clamp_zoom(zoom) == self.focus.global_zoom() {
			return;
		}
		self.focus.set_global_zoom(zoom);
		self.refresh_transform();
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.viewport = Viewport { width, height };
		self.layout.set_viewport(self.viewport);
		self.layout.reheat();
		let position = self.focus_position();
		self.focus.snap_transform(position, self.viewport);
	}

	fn focus_position(&self) -> Option<(f64, f64)> {
		self.focus.focused().and_then(|id| self.layout.position(id))
	}

	fn refresh_transform(&mut self) {
		let position = self.focus_position();
		self.focus.refresh_transform(position, self.viewport);
	}

	fn focus_changed(&mut self) {
		self.layout.set_focus(self.focus.focused());
		self.refresh_transform();
	}

	/// Enter focus on `id` and tell the embedder. Unknown ids are ignored.
	pub fn select(&mut self, id: &str) {
		match self.focus.enter_focus(id, self.session.graph()) {
			Ok(()) => {
				self.notifications.push(Notification::Select(id.to_owned()));
				self.focus_changed();
			}
			Err(e) => warn!("select ignored: {}", e),
		}
	}

	/// Leave focus, if any, and tell the embedder.
	pub fn deselect(&mut self) {
		if self.focus.exit_focus() {
			self.notifications.push(Notification::Deselect);
			self.focus_changed();
		}
	}

	pub fn take_notifications(&mut self) -> Vec<Notification> {
		std::mem::take(&mut self.notifications)
	}

	/// Node nearest to the screen point, within the hit radius.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<String> {
		hit_test::resolve_screen(
			(sx, sy),
			self.layout.positions(),
			&self.focus.transform(),
			self.config.hit_radius,
		)
		.map(str::to_owned)
	}

	/// Node under the normalized gesture cursor.
	pub fn node_at_normalized(&self, cursor: (f64, f64)) -> Option<String> {
		hit_test::resolve(
			cursor,
			self.layout.positions(),
			&self.focus.transform(),
			self.viewport,
			self.config.hit_radius,
		)
		.map(str::to_owned)
	}

	/// Re-resolve hover from whichever cursor is live; the hand wins over the
	/// mouse.
	pub fn update_hover(&mut self) {
		if self.drag.active {
			return;
		}
		let hovered = match (self.gesture_cursor, self.mouse_cursor) {
			(Some(cursor), _) => self.node_at_normalized(cursor),
			(None, Some((x, y))) => self.node_at_position(x, y),
			(None, None) => None,
		};
		self.set_hover(hovered);
	}

	pub fn set_hover(&mut self, node: Option<String>) {
		if self.hover.node == node {
			self.refresh_neighbors();
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Keep the previous highlight around for the fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.notifications.push(Notification::Hover(node.clone()));
		self.hover.node = node;
		if self.hover.node.is_some() && !was_hovering {
			self.hover.delay_t = 0.0;
		}
		self.refresh_neighbors();
	}

	fn refresh_neighbors(&mut self) {
		self.hover.neighbors.clear();
		if let Some(id) = self.hover.node.as_deref() {
			self.hover.neighbors = self
				.session
				.graph()
				.neighbors(id)
				.map(str::to_owned)
				.collect();
		}
	}

	pub fn is_highlighted(&self, id: &str) -> bool {
		self.hover.node.as_deref() == Some(id)
			|| self.hover.neighbors.contains(id)
			|| self.hover.prev_node.as_deref() == Some(id)
			|| self.hover.prev_neighbors.contains(id)
	}

	pub fn is_hovered(&self, id: &str) -> bool {
		self.hover.node.as_deref() == Some(id) || self.hover.prev_node.as_deref() == Some(id)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn mouse_move(&mut self, x: f64, y: f64) {
		self.mouse_cursor = Some((x, y));
		if let Some(id) = self.drag.node.clone().filter(|_| self.drag.active) {
			let k = self.focus.transform().k;
			let (dx, dy) = ((x - self.drag.start_x) / k, (y - self.drag.start_y) / k);
			if dx.hypot(dy) * k > CLICK_SLOP {
				self.drag.moved = true;
			}
			if self.drag.moved {
				let (nx, ny) = (self.drag.node_start.0 + dx, self.drag.node_start.1 + dy);
				self.layout.pin(&id, nx, ny);
			}
		} else {
			self.update_hover();
		}
	}

	/// Press on a node starts a drag; press on the background leaves focus.
	pub fn mouse_down(&mut self, x: f64, y: f64) {
		self.mouse_cursor = Some((x, y));
		match self.node_at_position(x, y) {
			Some(id) => {
				let start = self
					.layout
					.position(&id)
					.unwrap_or_else(|| self.focus.transform().invert((x, y)));
				self.drag = DragState {
					active: true,
					node: Some(id),
					start_x: x,
					start_y: y,
					node_start: start,
					moved: false,
				};
			}
			None => self.deselect(),
		}
	}

	/// End a drag. A press that never moved is the enter interaction.
	pub fn mouse_up(&mut self) {
		let drag = std::mem::take(&mut self.drag);
		if let Some(id) = drag.node.filter(|_| drag.active) {
			if drag.moved {
				self.layout.unpin(&id);
			} else if self.focus.focused() != Some(id.as_str()) {
				self.select(&id);
			}
		}
	}

	pub fn mouse_leave(&mut self) {
		self.mouse_up();
		self.mouse_cursor = None;
		self.update_hover();
	}

	pub fn wheel(&mut self, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let before = self.focus.global_zoom();
		self.set_global_zoom(before * factor);
		let zoom = self.focus.global_zoom();
		if zoom != before {
			self.notifications.push(Notification::Zoom(zoom));
		}
	}

	/// Feed one landmark frame through the gesture recognizer.
	pub fn landmarks(&mut self, sample: Option<&HandLandmarks>) {
		match gesture::cursor(sample) {
			CursorUpdate::Clear => self.gesture_cursor = None,
			CursorUpdate::Move(c) => self.gesture_cursor = Some(c),
			CursorUpdate::Keep => {}
		}
		self.update_hover();

		let step = gesture::step(
			self.gesture,
			sample,
			self.hover.node.as_deref(),
			self.focus.focused(),
			&self.thresholds,
		);
		self.gesture = step.state;
		match step.event {
			Some(GestureEvent::Select(id)) => {
				debug!("pinch select {}", id);
				self.select(&id);
			}
			Some(GestureEvent::Deselect) => {
				debug!("open-hand deselect");
				self.deselect();
			}
			None => {}
		}
	}

	/// Drop gesture input entirely, e.g. when the channel is disabled.
	pub fn clear_gesture(&mut self) {
		self.gesture = GestureState::default();
		self.gesture_cursor = None;
		self.update_hover();
	}

	pub fn is_animating(&self) -> bool {
		self.layout.is_running()
			|| self.focus.is_animating()
			|| self.visuals.is_animating()
			|| self.hover.node.is_some()
			|| self.hover.highlight_t > 0.0
	}

	pub fn tick(&mut self, dt: f64) {
		self.layout.tick();
		self.visuals.track(self.layout.positions());
		let position = self.focus_position();
		self.focus.follow(position, self.viewport);
		self.focus.advance(dt * 1000.0);
		self.visuals.advance(dt);
		self.flow_time += dt;
		self.update_hover();

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::super::types::{ConceptEvent, Landmark, RelationshipEvent};
	use super::*;

	const DT: f64 = 1.0 / 60.0;

	fn concept(id: &str, importance: f64) -> ConceptEvent {
		ConceptEvent {
			id: id.into(),
			label: id.to_uppercase(),
			importance,
		}
	}

	fn settled_state() -> ConceptGraphState {
		let mut state = ConceptGraphState::new(GraphConfig::default(), 800.0, 600.0);
		state.enqueue(UpdateEvent {
			concepts: vec![concept("a", 8.0), concept("b", 3.0), concept("c", 5.0)],
			relationships: vec![RelationshipEvent {
				source_id: "a".into(),
				target_id: "b".into(),
				strength: 2.0,
			}],
		});
		state.apply_pending();
		for _ in 0..400 {
			state.tick(DT);
		}
		state.take_notifications();
		state
	}

	fn screen_of(state: &ConceptGraphState, id: &str) -> (f64, f64) {
		state.focus.transform().project(state.layout.position(id).unwrap())
	}

	fn hand(cursor: (f64, f64), pinch: f64) -> HandLandmarks {
		let mut points = vec![Landmark::default(); 21];
		// mirrored: the cursor x is 1 - index.x
		let index = Landmark {
			x: 1.0 - cursor.0,
			y: cursor.1,
			z: 0.0,
		};
		points[HandLandmarks::INDEX_TIP] = index;
		points[HandLandmarks::THUMB_TIP] = Landmark {
			x: index.x + pinch,
			..index
		};
		HandLandmarks(points)
	}

	#[test]
	fn mouse_over_projected_node_hovers_it() {
		let mut state = settled_state();
		let (x, y) = screen_of(&state, "c");
		state.mouse_move(x, y);
		assert_eq!(state.hover.node.as_deref(), Some("c"));
		assert_eq!(
			state.take_notifications(),
			vec![Notification::Hover(Some("c".into()))]
		);

		state.mouse_move(-500.0, -500.0);
		assert_eq!(state.hover.node, None);
	}

	#[test]
	fn hover_tracks_neighbors() {
		let mut state = settled_state();
		let (x, y) = screen_of(&state, "a");
		state.mouse_move(x, y);
		assert!(state.is_highlighted("b"));
		assert!(!state.is_highlighted("c"));
	}

	#[test]
	fn pinch_over_node_selects_and_focuses() {
		let mut state = settled_state();
		let (sx, sy) = screen_of(&state, "b");
		let cursor = (sx / 800.0, sy / 600.0);
		let pinch = hand(cursor, 0.01);
		for _ in 0..10 {
			state.landmarks(Some(&pinch));
		}
		let notes = state.take_notifications();
		assert_eq!(
			notes
				.iter()
				.filter(|n| matches!(n, Notification::Select(_)))
				.count(),
			1
		);
		assert!(notes.contains(&Notification::Select("b".into())));
		assert_eq!(state.focus.focused(), Some("b"));
		assert_eq!(state.layout.forces().link_distance, 200.0);
		assert!(state.focus.is_animating());

		for _ in 0..100 {
			state.landmarks(Some(&pinch));
		}
		assert!(
			!state
				.take_notifications()
				.iter()
				.any(|n| matches!(n, Notification::Select(_)))
		);
	}

	#[test]
	fn open_hand_deselects() {
		let mut state = settled_state();
		state.select("a");
		let open = hand((0.5, 0.5), 0.3);
		for _ in 0..9 {
			state.landmarks(Some(&open));
		}
		assert_eq!(state.focus.focused(), None);
		assert!(state.take_notifications().contains(&Notification::Deselect));
		assert_eq!(state.layout.forces().link_distance, 150.0);
	}

	#[test]
	fn lost_hand_clears_gesture_cursor() {
		let mut state = settled_state();
		state.landmarks(Some(&hand((0.5, 0.5), 0.1)));
		assert!(state.gesture_cursor.is_some());
		state.landmarks(None);
		assert_eq!(state.gesture_cursor, None);
	}

	#[test]
	fn click_focuses_and_background_press_unfocuses() {
		let mut state = settled_state();
		let (x, y) = screen_of(&state, "a");
		state.mouse_down(x, y);
		state.mouse_up();
		assert_eq!(state.focus.focused(), Some("a"));

		state.mouse_down(-500.0, -500.0);
		state.mouse_up();
		assert_eq!(state.focus.focused(), None);
		let notes = state.take_notifications();
		assert!(notes.contains(&Notification::Select("a".into())));
		assert!(notes.contains(&Notification::Deselect));
	}

	#[test]
	fn drag_pins_then_releases() {
		let mut state = settled_state();
		let (x, y) = screen_of(&state, "c");
		state.mouse_down(x, y);
		state.mouse_move(x + 50.0, y + 20.0);
		assert!(state.layout.is_pinned("c"));
		state.mouse_up();
		assert!(!state.layout.is_pinned("c"));
		assert_eq!(state.focus.focused(), None);
	}

	#[test]
	fn new_concept_links_to_focus() {
		let mut state = settled_state();
		state.select("c");
		state.enqueue(UpdateEvent {
			concepts: vec![concept("d", 1.0)],
			relationships: vec![],
		});
		state.apply_pending();
		let link = state.session.graph().link_between("c", "d").unwrap();
		assert_eq!(link.strength, 3.0);
		assert!(state.layout.is_running());
	}

	#[test]
	fn reset_clears_focus_and_hover() {
		let mut state = settled_state();
		let (x, y) = screen_of(&state, "a");
		state.mouse_move(x, y);
		state.select("a");
		state.reset();
		assert_eq!(state.focus.focused(), None);
		assert_eq!(state.hover.node, None);
		assert!(state.session.graph().is_empty());
		assert!(state.take_notifications().contains(&Notification::Deselect));
	}

	#[test]
	fn focus_transform_settles_on_node() {
		let mut state = settled_state();
		state.select("a");
		// the reheat moves the node, so the camera keeps following until the
		// layout cools
		for _ in 0..600 {
			state.tick(DT);
		}
		let t = state.focus.transform();
		assert_eq!(t.k, 1.2);
	}

	#[test]
	fn camera_keeps_the_focused_node_centred() {
		let mut state = settled_state();
		state.select("c");
		for _ in 0..600 {
			state.tick(DT);
		}
		assert!(!state.focus.is_animating());
		let (x, y) = screen_of(&state, "c");
		assert!((x - 400.0).abs() <= 4.0 + 1e-6, "x = {}", x);
		assert!((y - 300.0).abs() <= 4.0 + 1e-6, "y = {}", y);
	}

	#[test]
	fn wheel_reports_the_new_zoom() {
		let mut state = settled_state();
		state.wheel(-1.0);
		assert_eq!(state.focus.global_zoom(), 1.1);
		assert_eq!(state.take_notifications(), vec![Notification::Zoom(1.1)]);

		for _ in 0..40 {
			state.wheel(-1.0);
		}
		assert_eq!(state.focus.global_zoom(), 3.0);
		state.take_notifications();
		state.wheel(-1.0);
		assert!(state.take_notifications().is_empty());
	}

	#[test]
	fn echoed_zoom_does_not_restart_the_transition() {
		let mut state = settled_state();
		state.wheel(1.0);
		for _ in 0..20 {
			state.tick(DT);
		}
		let mid = state.focus.transform();
		state.set_global_zoom(state.focus.global_zoom());
		assert_eq!(state.focus.transform(), mid);
		assert!(state.focus.is_animating());
	}
}
