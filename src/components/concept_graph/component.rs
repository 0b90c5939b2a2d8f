use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::config::GraphConfig;
use super::error::Result;
use super::layout::LayoutMode;
use super::render;
use super::state::{ConceptGraphState, Notification};
use super::types::{HandLandmarks, SessionSnapshot, UpdateEvent};

const FRAME_DT: f64 = 0.016;
/// Longest step fed to the simulation after a stall or a throttled tab.
const MAX_FRAME_DT: f64 = 0.1;

/// Seconds between two `requestAnimationFrame` timestamps.
fn frame_dt(previous_ms: Option<f64>, now_ms: f64) -> f64 {
	previous_ms.map_or(FRAME_DT, |prev| ((now_ms - prev) / 1000.0).clamp(0.0, MAX_FRAME_DT))
}

/// Shared access to a mounted canvas' session, for the embedding page.
///
/// Cloning is cheap; every clone sees the same session. Before the canvas
/// mounts, accessors return `None`.
#[derive(Clone, Default)]
pub struct GraphHandle(Rc<RefCell<Option<ConceptGraphState>>>);

impl GraphHandle {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_mounted(&self) -> bool {
		self.0.borrow().is_some()
	}

	/// Export the current graph with plain-id link endpoints.
	pub fn snapshot(&self, transcript: &str, timestamp_ms: f64) -> Option<SessionSnapshot> {
		self.0
			.borrow()
			.as_ref()
			.map(|s| s.snapshot(transcript, timestamp_ms))
	}

	pub fn export_json(&self, transcript: &str, timestamp_ms: f64) -> Option<Result<String>> {
		self.0
			.borrow()
			.as_ref()
			.map(|s| s.session.export_json(transcript, timestamp_ms))
	}

	/// Start a new, empty session.
	pub fn reset(&self) {
		if let Some(ref mut s) = *self.0.borrow_mut() {
			s.reset();
		}
	}

	pub fn session_id(&self) -> Option<String> {
		self.0.borrow().as_ref().map(|s| s.session.id().to_owned())
	}
}

#[derive(Clone, Copy)]
struct Listeners {
	hover: Option<Callback<Option<String>>>,
	select: Option<Callback<String>>,
	deselect: Option<Callback<()>>,
	zoom: Option<Callback<f64>>,
}

impl Listeners {
	/// Drain queued notifications and run callbacks with the state released,
	/// so a callback may use the handle.
	fn dispatch(&self, state: &RefCell<Option<ConceptGraphState>>) {
		let notes = match *state.borrow_mut() {
			Some(ref mut s) => s.take_notifications(),
			None => return,
		};
		for note in notes {
			match note {
				Notification::Hover(id) => {
					if let Some(cb) = self.hover {
						cb.run(id);
					}
				}
				Notification::Select(id) => {
					if let Some(cb) = self.select {
						cb.run(id);
					}
				}
				Notification::Deselect => {
					if let Some(cb) = self.deselect {
						cb.run(());
					}
				}
				Notification::Zoom(zoom) => {
					if let Some(cb) = self.zoom {
						cb.run(zoom);
					}
				}
			}
		}
	}
}

/// Browser callbacks owned by one mounted canvas.
#[derive(Clone, Default)]
struct FrameLoop {
	animate: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>,
	resize: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
	pending: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
	fn request(&self, window: &Window) {
		if let Some(ref cb) = *self.animate.borrow() {
			self.pending
				.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	}

	/// Cancel the scheduled frame, unhook the resize listener and release both
	/// closures along with the state they hold.
	fn detach(&self, window: Option<&Window>) {
		if let (Some(id), Some(win)) = (self.pending.take(), window) {
			let _ = win.cancel_animation_frame(id);
		}
		if let Some(cb) = self.resize.borrow_mut().take() {
			if let Some(win) = window {
				let _ = win.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}
		drop(self.animate.borrow_mut().take());
	}
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Live concept graph on a 2D canvas.
///
/// `events` is an append-only log: entries past the last one seen are queued
/// and merged on the next frame. A shorter log than before starts a new
/// session. Hand landmarks drive a gesture cursor when `gestures_enabled`.
#[component]
pub fn ConceptGraphCanvas(
	#[prop(into)] events: Signal<Vec<UpdateEvent>>,
	#[prop(into, default = Signal::stored(None))] landmarks: Signal<Option<HandLandmarks>>,
	#[prop(into, default = Signal::stored(true))] gestures_enabled: Signal<bool>,
	#[prop(into, default = Signal::stored(LayoutMode::Network))] mode: Signal<LayoutMode>,
	#[prop(into, default = Signal::stored(1.0))] global_zoom: Signal<f64>,
	#[prop(optional)] on_node_hover: Option<Callback<Option<String>>>,
	#[prop(optional)] on_node_select: Option<Callback<String>>,
	#[prop(optional)] on_node_deselect: Option<Callback<()>>,
	/// Fired when the wheel changes the global zoom.
	#[prop(optional)] on_zoom_change: Option<Callback<f64>>,
	#[prop(optional)] handle: GraphHandle,
	#[prop(optional)] config: GraphConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let config = match config.validate() {
		Ok(()) => config,
		Err(e) => {
			warn!("{}; falling back to defaults", e);
			GraphConfig::default()
		}
	};
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state = handle.0.clone();
	*state.borrow_mut() = Some(ConceptGraphState::new(
		config,
		width.unwrap_or(800.0),
		height.unwrap_or(600.0),
	));
	let listeners = Listeners {
		hover: on_node_hover,
		select: on_node_select,
		deselect: on_node_deselect,
		zoom: on_zoom_change,
	};
	let stopped = Arc::new(AtomicBool::new(false));
	let frames = FrameLoop::default();
	let (state_init, frames_init, stopped_init) = (state.clone(), frames.clone(), stopped.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("2d canvas context unavailable");
			return;
		};
		if let Some(ref mut s) = *state_init.borrow_mut() {
			s.resize(w, h);
			info!("canvas mounted at {}x{}, session {}", w, h, s.session.id());
		}

		if fullscreen {
			let (state_resize, canvas_resize, stopped_resize) =
				(state_init.clone(), canvas.clone(), stopped_init.clone());
			*frames_init.resize.borrow_mut() = Some(Closure::new(move || {
				if stopped_resize.load(Ordering::Relaxed) {
					return;
				}
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *frames_init.resize.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, frames_anim, stopped_anim) =
			(state_init.clone(), frames_init.clone(), stopped_init.clone());
		let mut last_frame = None;
		*frames_init.animate.borrow_mut() = Some(Closure::new(move |now: f64| {
			if stopped_anim.load(Ordering::Relaxed) {
				debug!("frame loop stopped");
				return;
			}
			let dt = frame_dt(last_frame, now);
			last_frame = Some(now);
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.apply_pending();
				if s.is_animating() {
					s.tick(dt);
				}
				render::render(s, &ctx);
			}
			listeners.dispatch(&state_anim);
			if let Some(win) = web_sys::window() {
				frames_anim.request(&win);
			}
		}));
		frames_init.request(&window);
	});

	let (state_ev, seen) = (state.clone(), Rc::new(Cell::new(0usize)));
	Effect::new(move |_| {
		events.with(|log| {
			let mut guard = state_ev.borrow_mut();
			let Some(s) = guard.as_mut() else {
				return;
			};
			if log.len() < seen.get() {
				info!("event log shrank, starting a new session");
				s.reset();
				seen.set(0);
			}
			for event in &log[seen.get()..] {
				s.enqueue(event.clone());
			}
			seen.set(log.len());
		});
	});

	let state_mode = state.clone();
	Effect::new(move |_| {
		let mode = mode.get();
		if let Some(ref mut s) = *state_mode.borrow_mut() {
			s.set_mode(mode);
		}
	});

	let state_zoom = state.clone();
	Effect::new(move |_| {
		let zoom = global_zoom.get();
		if let Some(ref mut s) = *state_zoom.borrow_mut() {
			s.set_global_zoom(zoom);
		}
	});

	let (state_lm, stopped_lm) = (state.clone(), stopped.clone());
	Effect::new(move |_| {
		let enabled = gestures_enabled.get();
		landmarks.with(|sample| {
			if stopped_lm.load(Ordering::Relaxed) {
				return;
			}
			if let Some(ref mut s) = *state_lm.borrow_mut() {
				if enabled {
					s.landmarks(sample.as_ref());
				} else {
					s.clear_gesture();
				}
			}
		});
		listeners.dispatch(&state_lm);
	});

	let (stopped_cleanup, teardown) = (stopped.clone(), StoredValue::new_local(frames));
	on_cleanup(move || {
		stopped_cleanup.store(true, Ordering::Relaxed);
		teardown.try_with_value(|frames| frames.detach(web_sys::window().as_ref()));
		debug!("canvas detached");
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.mouse_down(x, y);
		}
		listeners.dispatch(&state_md);
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.mouse_move(x, y);
		}
		listeners.dispatch(&state_mm);
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.mouse_up();
		}
		listeners.dispatch(&state_mu);
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.mouse_leave();
		}
		listeners.dispatch(&state_ml);
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.wheel(ev.delta_y());
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="concept-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: pointer;"
		/>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_frame_uses_nominal_step() {
		assert_eq!(frame_dt(None, 1234.0), FRAME_DT);
	}

	#[test]
	fn frame_step_follows_timestamps() {
		assert_eq!(frame_dt(Some(1000.0), 1008.0), 0.008);
		assert_eq!(frame_dt(Some(1000.0), 1033.0), 0.033);
	}

	#[test]
	fn detach_forgets_the_pending_frame() {
		let frames = FrameLoop::default();
		frames.pending.set(Some(7));
		let shared = frames.clone();
		frames.detach(None);
		assert_eq!(shared.pending.get(), None);
		assert!(shared.animate.borrow().is_none());
		assert!(shared.resize.borrow().is_none());
	}

	#[test]
	fn stalled_frames_are_clamped() {
		assert_eq!(frame_dt(Some(0.0), 5000.0), MAX_FRAME_DT);
		assert_eq!(frame_dt(Some(50.0), 40.0), 0.0);
	}
}
