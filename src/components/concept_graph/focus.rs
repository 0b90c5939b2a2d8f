//! Single-node focus and the view transform it implies.

use log::info;

use super::config::{GraphConfig, clamp_zoom};
use super::error::{GraphError, Result};
use super::types::{Graph, Viewport};

/// Screen distance the focused node may drift before the camera follows it.
const FOLLOW_SLOP: f64 = 4.0;

pub fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// `screen = graph * k + (x, y)`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl ViewTransform {
	/// Origin at the viewport centre, scaled by `k`.
	pub fn centered(viewport: Viewport, k: f64) -> Self {
		Self {
			x: viewport.width / 2.0,
			y: viewport.height / 2.0,
			k,
		}
	}

	/// Puts graph point `(px, py)` at the viewport centre, scaled by `k`.
	pub fn centered_on(viewport: Viewport, (px, py): (f64, f64), k: f64) -> Self {
		Self {
			x: viewport.width / 2.0 - px * k,
			y: viewport.height / 2.0 - py * k,
			k,
		}
	}

	/// Graph space to screen space. Every consumer that needs a node's screen
	/// position goes through here.
	pub fn project(&self, (gx, gy): (f64, f64)) -> (f64, f64) {
		(gx * self.k + self.x, gy * self.k + self.y)
	}

	pub fn invert(&self, (sx, sy): (f64, f64)) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	pub fn lerp(&self, to: &ViewTransform, t: f64) -> Self {
		Self {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

/// Fixed-duration ease-out transition between two transforms. Retargeting
/// starts over from wherever the current transition has got to.
#[derive(Clone, Debug)]
pub struct TransformAnimation {
	from: ViewTransform,
	to: ViewTransform,
	elapsed_ms: f64,
	duration_ms: f64,
}

impl TransformAnimation {
	pub fn settled(at: ViewTransform, duration_ms: f64) -> Self {
		Self {
			from: at,
			to: at,
			elapsed_ms: duration_ms,
			duration_ms,
		}
	}

	pub fn current(&self) -> ViewTransform {
		if self.duration_ms <= 0.0 || self.elapsed_ms >= self.duration_ms {
			return self.to;
		}
		let t = ease_out_cubic(self.elapsed_ms / self.duration_ms);
		self.from.lerp(&self.to, t)
	}

	pub fn target(&self) -> ViewTransform {
		self.to
	}

	pub fn is_animating(&self) -> bool {
		self.elapsed_ms < self.duration_ms && self.from != self.to
	}

	pub fn retarget(&mut self, to: ViewTransform) {
		if to == self.to {
			return;
		}
		self.from = self.current();
		self.to = to;
		self.elapsed_ms = 0.0;
	}

	/// Jump without animating, e.g. after a resize.
	pub fn snap(&mut self, to: ViewTransform) {
		self.from = to;
		self.to = to;
		self.elapsed_ms = self.duration_ms;
	}

	pub fn advance(&mut self, dt_ms: f64) -> ViewTransform {
		self.elapsed_ms = (self.elapsed_ms + dt_ms).min(self.duration_ms);
		self.current()
	}
}

/// Unfocused or Focused(node id), plus the animated view transform.
pub struct FocusController {
	focused: Option<String>,
	global_zoom: f64,
	focus_zoom: f64,
	animation: TransformAnimation,
}

impl FocusController {
	pub fn new(config: &GraphConfig, viewport: Viewport) -> Self {
		let global_zoom = config.clamped_global_zoom();
		Self {
			focused: None,
			global_zoom,
			focus_zoom: config.focus_zoom,
			animation: TransformAnimation::settled(
				ViewTransform::centered(viewport, global_zoom),
				config.transition_ms,
			),
		}
	}

	pub fn focused(&self) -> Option<&str> {
		self.focused.as_deref()
	}

	pub fn global_zoom(&self) -> f64 {
		self.global_zoom
	}

	/// Focus `id`. Fails, leaving the state untouched, if `id` is not in `graph`.
	pub fn enter_focus(&mut self, id: &str, graph: &Graph) -> Result<()> {
		if !graph.contains_node(id) {
			return Err(GraphError::UnknownNode(id.to_owned()));
		}
		if self.focused.as_deref() != Some(id) {
			info!("focus -> {}", id);
			self.focused = Some(id.to_owned());
		}
		Ok(())
	}

	/// Returns whether focus was actually held.
	pub fn exit_focus(&mut self) -> bool {
		match self.focused.take() {
			Some(id) => {
				info!("focus released from {}", id);
				true
			}
			None => false,
		}
	}

	/// Clear focus if its node is gone. Returns whether focus was cleared.
	pub fn validate(&mut self, graph: &Graph) -> bool {
		let stale = self
			.focused
			.as_deref()
			.is_some_and(|id| !graph.contains_node(id));
		if stale {
			self.exit_focus();
		}
		stale
	}

	pub fn set_global_zoom(&mut self, zoom: f64) {
		self.global_zoom = clamp_zoom(zoom);
	}

	/// Where the view should be: centred on the focused node at the focus zoom
	/// when it has a position, otherwise centred on the origin at global zoom.
	pub fn target_transform(&self, focus_position: Option<(f64, f64)>, viewport: Viewport) -> ViewTransform {
		match (self.focused.as_deref(), focus_position) {
			(Some(_), Some(pos)) => ViewTransform::centered_on(viewport, pos, self.focus_zoom),
			_ => ViewTransform::centered(viewport, self.global_zoom),
		}
	}

	/// Start a transition to the transform implied by the current state.
	pub fn refresh_transform(&mut self, focus_position: Option<(f64, f64)>, viewport: Viewport) {
		let target = self.target_transform(focus_position, viewport);
		self.animation.retarget(target);
	}

	/// Chase the focused node once it has drifted more than a few pixels from
	/// where the camera is heading. Returns whether a new transition started.
	pub fn follow(&mut self, focus_position: Option<(f64, f64)>, viewport: Viewport) -> bool {
		if self.focused.is_none() || focus_position.is_none() {
			return false;
		}
		let target = self.target_transform(focus_position, viewport);
		let heading = self.animation.target();
		if target.k == heading.k
			&& (target.x - heading.x).abs() <= FOLLOW_SLOP
			&& (target.y - heading.y).abs() <= FOLLOW_SLOP
		{
			return false;
		}
		self.animation.retarget(target);
		true
	}

	pub fn snap_transform(&mut self, focus_position: Option<(f64, f64)>, viewport: Viewport) {
		let target = self.target_transform(focus_position, viewport);
		self.animation.snap(target);
	}

	/// The transform currently on screen.
	pub fn transform(&self) -> ViewTransform {
		self.animation.current()
	}

	pub fn is_animating(&self) -> bool {
		self.animation.is_animating()
	}

	pub fn advance(&mut self, dt_ms: f64) -> ViewTransform {
		self.animation.advance(dt_ms)
	}
}

#[cfg(test)]
mod tests {
	use super::super::store::apply_update;
	use super::super::types::{ConceptEvent, MergeContext, UpdateEvent};
	use super::*;

	const VIEW: Viewport = Viewport {
		width: 1000.0,
		height: 600.0,
	};

	fn graph() -> Graph {
		apply_update(
			&Graph::new(),
			&UpdateEvent {
				concepts: vec![ConceptEvent {
					id: "a".into(),
					label: "A".into(),
					importance: 3.0,
				}],
				relationships: vec![],
			},
			&MergeContext::default(),
		)
	}

	fn controller() -> FocusController {
		FocusController::new(&GraphConfig::default(), VIEW)
	}

	#[test]
	fn focused_transform_centres_the_node() {
		let mut focus = controller();
		focus.enter_focus("a", &graph()).unwrap();
		let t = focus.target_transform(Some((100.0, 50.0)), VIEW);
		assert_eq!(t, ViewTransform { x: 380.0, y: 240.0, k: 1.2 });
		assert_eq!(t.project((100.0, 50.0)), (500.0, 300.0));
	}

	#[test]
	fn unfocused_transform_uses_global_zoom() {
		let mut focus = controller();
		focus.set_global_zoom(2.0);
		let t = focus.target_transform(Some((100.0, 50.0)), VIEW);
		assert_eq!(t, ViewTransform { x: 500.0, y: 300.0, k: 2.0 });

		focus.set_global_zoom(9.0);
		assert_eq!(focus.global_zoom(), 3.0);
	}

	#[test]
	fn unknown_node_cannot_be_focused() {
		let mut focus = controller();
		let err = focus.enter_focus("nope", &graph()).unwrap_err();
		assert!(matches!(err, GraphError::UnknownNode(id) if id == "nope"));
		assert_eq!(focus.focused(), None);
	}

	#[test]
	fn exit_focus_reports_change() {
		let mut focus = controller();
		assert!(!focus.exit_focus());
		focus.enter_focus("a", &graph()).unwrap();
		assert!(focus.exit_focus());
		assert_eq!(focus.focused(), None);
	}

	#[test]
	fn validate_clears_focus_after_reset() {
		let mut focus = controller();
		focus.enter_focus("a", &graph()).unwrap();
		assert!(!focus.validate(&graph()));
		assert!(focus.validate(&Graph::new()));
		assert_eq!(focus.focused(), None);
	}

	#[test]
	fn transition_eases_out_over_duration() {
		let mut focus = controller();
		focus.enter_focus("a", &graph()).unwrap();
		focus.refresh_transform(Some((0.0, 0.0)), VIEW);
		assert!(focus.is_animating());

		let half = focus.advance(375.0);
		// ease-out covers 87.5% of the distance at the halfway mark
		assert!((half.k - (1.0 + 0.2 * 0.875)).abs() < 1e-9);

		let done = focus.advance(375.0);
		assert_eq!(done.k, 1.2);
		assert!(!focus.is_animating());
	}

	#[test]
	fn retarget_supersedes_in_flight_transition() {
		let mut anim = TransformAnimation::settled(ViewTransform::centered(VIEW, 1.0), 750.0);
		anim.retarget(ViewTransform::centered(VIEW, 3.0));
		let mid = anim.advance(375.0);
		anim.retarget(ViewTransform::centered(VIEW, 1.0));
		assert_eq!(anim.current(), mid);
		assert_eq!(anim.advance(750.0).k, 1.0);
	}

	#[test]
	fn follow_ignores_small_drift() {
		let mut focus = controller();
		focus.enter_focus("a", &graph()).unwrap();
		focus.refresh_transform(Some((100.0, 50.0)), VIEW);
		assert!(!focus.follow(Some((102.0, 53.0)), VIEW));
		assert_eq!(focus.animation.target().x, 380.0);
	}

	#[test]
	fn follow_chases_a_drifting_node() {
		let mut focus = controller();
		focus.enter_focus("a", &graph()).unwrap();
		focus.refresh_transform(Some((100.0, 50.0)), VIEW);
		assert!(focus.follow(Some((150.0, 50.0)), VIEW));
		assert_eq!(focus.animation.target().x, 320.0);
		assert!(focus.is_animating());
	}

	#[test]
	fn follow_is_idle_without_focus() {
		let mut focus = controller();
		assert!(!focus.follow(Some((150.0, 50.0)), VIEW));
		assert!(!focus.is_animating());
	}

	#[test]
	fn transition_runs_on_elapsed_time_not_frames() {
		let mut focus = controller();
		focus.enter_focus("a", &graph()).unwrap();
		focus.refresh_transform(Some((100.0, 50.0)), VIEW);
		// 60 frames at 120Hz is only 480ms
		for _ in 0..60 {
			focus.advance(8.0);
		}
		assert!(focus.is_animating());

		let mut focus = controller();
		focus.enter_focus("a", &graph()).unwrap();
		focus.refresh_transform(Some((100.0, 50.0)), VIEW);
		// 8 throttled frames cover the whole window
		for _ in 0..8 {
			focus.advance(100.0);
		}
		assert!(!focus.is_animating());
		assert_eq!(focus.transform(), focus.target_transform(Some((100.0, 50.0)), VIEW));
	}
}
