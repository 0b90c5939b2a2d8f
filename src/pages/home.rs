use std::time::Duration;

use leptos::prelude::*;
use log::{info, warn};

use crate::components::concept_graph::{
	ConceptGraphCanvas, GraphHandle, HandLandmarks, LayoutMode, UpdateEvent,
};

/// Extractor payloads replayed by the demo, one per tick.
const SCRIPT: &[&str] = &[
	r#"{"concepts":[{"id":"rust","label":"Rust","importance":8}]}"#,
	r#"{"concepts":[{"id":"ownership","label":"Ownership","importance":5},{"id":"borrowing","label":"Borrowing","importance":4}],
	   "relationships":[{"sourceId":"rust","targetId":"ownership","strength":3},{"sourceId":"ownership","targetId":"borrowing","strength":2}]}"#,
	r#"{"concepts":[{"id":"lifetimes","label":"Lifetimes","importance":3},{"label":"missing id"}],
	   "relationships":[{"sourceId":"borrowing","targetId":"lifetimes","strength":2}]}"#,
	r#"{"concepts":[{"id":"traits","label":"Traits","importance":6},{"id":"generics","label":"Generics","importance":4}],
	   "relationships":[{"sourceId":"rust","targetId":"traits","strength":2},{"sourceId":"traits","targetId":"generics","strength":3}]}"#,
	r#"{"concepts":[{"id":"rust","label":"Rust","importance":2},{"id":"wasm","label":"WebAssembly","importance":3}],
	   "relationships":[{"sourceId":"rust","targetId":"wasm","strength":1},{"sourceId":"wasm","targetId":"nowhere","strength":1}]}"#,
	r#"{"concepts":[{"id":"async","label":"Async","importance":5},{"id":"futures","label":"Futures","importance":2}],
	   "relationships":[{"sourceId":"async","targetId":"futures","strength":4},{"sourceId":"traits","targetId":"futures","strength":1}]}"#,
	r#"{"concepts":[{"id":"ownership","label":"Ownership","importance":3}],
	   "relationships":[{"sourceId":"rust","targetId":"ownership","strength":2}]}"#,
];

/// Demo page feeding a scripted concept stream into the canvas.
#[component]
pub fn Home() -> impl IntoView {
	let events = RwSignal::new(Vec::<UpdateEvent>::new());
	let mode = RwSignal::new(LayoutMode::Network);
	let zoom = RwSignal::new(1.0_f64);
	let focused = RwSignal::new(None::<String>);
	let hovered = RwSignal::new(None::<String>);
	let landmarks = Signal::derive(|| None::<HandLandmarks>);
	// Rc-backed, so local storage only
	let handle = StoredValue::new_local(GraphHandle::new());

	let cursor = StoredValue::new(0usize);
	match set_interval_with_handle(
		move || {
			let next = cursor.get_value();
			let Some(raw) = SCRIPT.get(next) else {
				return;
			};
			cursor.set_value(next + 1);
			match UpdateEvent::from_json(raw) {
				Ok(event) => events.update(|log| log.push(event)),
				Err(e) => warn!("script entry {} rejected: {}", next, e),
			}
		},
		Duration::from_millis(1800),
	) {
		Ok(interval) => on_cleanup(move || interval.clear()),
		Err(e) => warn!("could not start concept stream: {:?}", e),
	}

	let on_export = move |_| {
		match handle.with_value(|h| h.export_json("", js_sys::Date::now())) {
			Some(Ok(json)) => info!("snapshot: {}", json),
			Some(Err(e)) => warn!("snapshot failed: {}", e),
			None => warn!("canvas not mounted"),
		}
	};
	let on_reset = move |_| {
		cursor.set_value(0);
		events.set(Vec::new());
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<ConceptGraphCanvas
					events=events
					landmarks=landmarks
					mode=mode
					global_zoom=zoom
					handle=handle.get_value()
					on_zoom_change=Callback::new(move |z| zoom.set(z))
					on_node_hover=Callback::new(move |id| hovered.set(id))
					on_node_select=Callback::new(move |id| focused.set(Some(id)))
					on_node_deselect=Callback::new(move |_| focused.set(None))
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>"Concept Graph"</h1>
					<p class="subtitle">
						"Click a concept to focus it. Click the background to zoom back out."
					</p>
					<div class="graph-controls">
						{LayoutMode::ALL
							.into_iter()
							.map(|m| {
								view! {
									<button
										class:active=move || mode.get() == m
										on:click=move |_| mode.set(m)
									>
										{m.as_str()}
									</button>
								}
							})
							.collect_view()}
						<input
							type="range"
							min="0.2"
							max="3"
							step="0.1"
							prop:value=move || zoom.get()
							on:input=move |ev| {
								if let Ok(z) = event_target_value(&ev).parse::<f64>() {
									zoom.set(z);
								}
							}
						/>
						<button on:click=on_export>"Export"</button>
						<button on:click=on_reset>"Reset"</button>
					</div>
					<p class="status">
						{move || match (focused.get(), hovered.get()) {
							(Some(f), _) => format!("Focused: {}", f),
							(None, Some(h)) => format!("Hovering: {}", h),
							(None, None) => String::new(),
						}}
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn assert_send_sync<T: Send + Sync>() {}

	#[test]
	fn local_handle_store_crosses_send_boundaries() {
		assert_send_sync::<StoredValue<GraphHandle, LocalStorage>>();
	}

	#[test]
	fn script_entries_parse() {
		let events: Vec<UpdateEvent> = SCRIPT
			.iter()
			.map(|raw| UpdateEvent::from_json(raw).unwrap())
			.collect();
		assert_eq!(events.len(), SCRIPT.len());
		// the entry without an id is skipped, its sibling kept
		assert_eq!(events[2].concepts.len(), 1);
		assert_eq!(events[2].concepts[0].id, "lifetimes");
	}
}
