use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::focus::ease_out_cubic;
use super::layout::LinkShape;
use super::reconcile::{NODE_RADIUS, node_radius};
use super::state::ConceptGraphState;

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// Palette slot by importance tier.
fn node_color(importance: f64) -> &'static str {
	let tier = (importance.max(0.0) / 2.0) as usize;
	COLORS[tier % COLORS.len()]
}

pub fn render(state: &ConceptGraphState, ctx: &CanvasRenderingContext2d) {
	let transform = state.focus.transform();
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.viewport.width, state.viewport.height);
	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);
	draw_links(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
	draw_gesture_cursor(state, ctx);
}

fn draw_links(state: &ConceptGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.focus.transform().k;
	let (line_width, dash, gap) = (1.5 / k, 8.0 / k, 4.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.hover.highlight_t);
	let shape = state.layout.mode().link_shape();

	for link in state.visuals.links() {
		let (Some((x1, y1)), Some((x2, y2))) = (
			state.layout.position(&link.source),
			state.layout.position(&link.target),
		) else {
			continue;
		};
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		let is_highlighted =
			state.is_highlighted(&link.source) && state.is_highlighted(&link.target);
		// t=0: every link at 0.6; t=1: highlighted at 0.9, others at 0.15
		let (alpha, width) = if is_highlighted {
			(0.6 + 0.3 * t, line_width * (1.0 + 0.3 * t))
		} else {
			(0.6 - 0.45 * t, line_width * (1.0 - 0.3 * t))
		};
		let strength = state
			.session
			.graph()
			.link_between(&link.source, &link.target)
			.map_or(1.0, |l| l.strength);

		ctx.set_stroke_style_str(&format!(
			"rgba(100, 180, 255, {})",
			alpha * link.opacity.value
		));
		ctx.set_line_width(width * (1.0 + strength.clamp(0.0, 10.0) * 0.1));
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(dash),
			&JsValue::from_f64(gap),
		));
		ctx.set_line_dash_offset(dash_offset);

		ctx.begin_path();
		ctx.move_to(x1, y1);
		match shape {
			LinkShape::Straight => ctx.line_to(x2, y2),
			LinkShape::Curved => {
				// control point off the midpoint, perpendicular to the chord
				let (mx, my) = ((x1 + x2) / 2.0, (y1 + y2) / 2.0);
				let bend = dist * 0.25;
				let (cx, cy) = (mx - dy / dist * bend, my + dx / dist * bend);
				ctx.quadratic_curve_to(cx, cy, x2, y2);
			}
		}
		ctx.stroke();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_nodes(state: &ConceptGraphState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.focus.transform().k,
	);
	let focused = state.focus.focused();
	let font = format!("{}px sans-serif", 11.0 / k.max(0.5));

	for node in state.session.graph().nodes() {
		let Some((x, y)) = state.layout.position(&node.id) else {
			continue;
		};
		let visual = state.visuals.node(&node.id);
		let base_radius = visual.map_or_else(|| node_radius(node.importance), |v| v.radius.value);
		let opacity = visual.map_or(1.0, |v| v.opacity.value);
		let highlighted = has_highlight && state.is_highlighted(&node.id);
		let is_hovered = state.is_hovered(&node.id);
		let is_neighbor = highlighted && !is_hovered;

		let (alpha, radius, glow_radius) = if !has_highlight {
			(1.0, base_radius, 0.0)
		} else if is_hovered {
			(1.0, base_radius * (1.0 + 0.35 * t), base_radius * (1.8 + 1.2 * t))
		} else if is_neighbor {
			(1.0, base_radius * (1.0 + 0.2 * t), base_radius * (1.4 + 0.6 * t))
		} else {
			(1.0 - 0.7 * t, base_radius * (1.0 - 0.15 * t), 0.0)
		};

		if glow_radius > 0.0 && t > 0.01 {
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow_radius) {
				let glow = if is_hovered { 0.35 * t } else { 0.2 * t };
				let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {})", glow));
				let _ = gradient
					.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", glow * 0.3));
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		ctx.set_global_alpha(alpha * opacity);
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius.max(0.0), 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node_color(node.importance));
		ctx.fill();

		if focused == Some(node.id.as_str()) {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + NODE_RADIUS / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str("rgba(255, 215, 0, 0.9)");
			ctx.set_line_width(2.0 / k);
			ctx.stroke();
		} else if is_hovered && t > 0.01 {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.7 * t));
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}

		ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha * 0.85));
		ctx.set_font(&font);
		let _ = ctx.fill_text(&node.label, x + radius + 3.0, y + 3.0);
		ctx.set_global_alpha(1.0);
	}

	for (_, visual) in state.visuals.nodes().filter(|(_, v)| v.exiting) {
		let Some((x, y)) = visual.position else {
			continue;
		};
		ctx.set_global_alpha(visual.opacity.value * 0.5);
		ctx.begin_path();
		let _ = ctx.arc(x, y, visual.radius.value.max(0.0), 0.0, 2.0 * PI);
		ctx.set_fill_style_str(COLORS[COLORS.len() - 3]);
		ctx.fill();
	}
	ctx.set_global_alpha(1.0);
}

fn draw_gesture_cursor(state: &ConceptGraphState, ctx: &CanvasRenderingContext2d) {
	let Some((cx, cy)) = state.gesture_cursor else {
		return;
	};
	let (x, y) = (cx * state.viewport.width, cy * state.viewport.height);
	let pinching = state.gesture.pinch_frames > 0;
	ctx.begin_path();
	let _ = ctx.arc(x, y, if pinching { 8.0 } else { 12.0 }, 0.0, 2.0 * PI);
	ctx.set_stroke_style_str(if pinching {
		"rgba(255, 215, 0, 0.9)"
	} else {
		"rgba(255, 255, 255, 0.7)"
	});
	ctx.set_line_width(2.0);
	ctx.stroke();
}
