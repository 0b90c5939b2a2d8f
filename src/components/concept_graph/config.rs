use serde::Deserialize;

use super::error::{GraphError, Result};

pub const IMPORTANCE_CAP: f64 = 20.0;
pub const STRENGTH_CAP: f64 = 10.0;
pub const MERGE_GROWTH: f64 = 0.5;
pub const CONTEXTUAL_LINK_STRENGTH: f64 = 3.0;
pub const MIN_GLOBAL_ZOOM: f64 = 0.2;
pub const MAX_GLOBAL_ZOOM: f64 = 3.0;

/// Tunables for interaction and view behaviour. Every field has a default, so
/// a JSON override only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
	/// Screen-space radius (px) within which a cursor resolves to a node.
	pub hit_radius: f64,
	/// Zoom factor applied while a node is focused.
	pub focus_zoom: f64,
	/// Duration of a view transform change.
	pub transition_ms: f64,
	/// Zoom used while unfocused, clamped to `[0.2, 3.0]`.
	pub global_zoom: f64,
	/// Thumb/index distance below which the hand is pinching.
	pub pinch_threshold: f64,
	/// Thumb/index distance above which the hand is open.
	pub spread_threshold: f64,
	/// Pinch frames that must be exceeded before a select fires.
	pub pinch_frames: u32,
	/// Open-hand frames that must be exceeded before a deselect fires.
	pub spread_frames: u32,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			hit_radius: 70.0,
			focus_zoom: 1.2,
			transition_ms: 750.0,
			global_zoom: 1.0,
			pinch_threshold: 0.05,
			spread_threshold: 0.20,
			pinch_frames: 5,
			spread_frames: 8,
		}
	}
}

impl GraphConfig {
	pub fn from_json(raw: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(raw)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		if self.pinch_threshold >= self.spread_threshold {
			return Err(GraphError::Config(format!(
				"pinch threshold {} must be below spread threshold {}",
				self.pinch_threshold, self.spread_threshold
			)));
		}
		if self.hit_radius <= 0.0 || self.focus_zoom <= 0.0 || self.transition_ms < 0.0 {
			return Err(GraphError::Config(
				"hit radius and focus zoom must be positive".into(),
			));
		}
		Ok(())
	}

	pub fn clamped_global_zoom(&self) -> f64 {
		clamp_zoom(self.global_zoom)
	}
}

pub fn clamp_zoom(zoom: f64) -> f64 {
	zoom.clamp(MIN_GLOBAL_ZOOM, MAX_GLOBAL_ZOOM)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_override_keeps_defaults() {
		let config = GraphConfig::from_json(r#"{"hit_radius": 40}"#).unwrap();
		assert_eq!(config.hit_radius, 40.0);
		assert_eq!(config.pinch_frames, 5);
		assert_eq!(config.focus_zoom, 1.2);
	}

	#[test]
	fn inverted_thresholds_are_rejected() {
		let err = GraphConfig::from_json(r#"{"pinch_threshold": 0.3}"#).unwrap_err();
		assert!(matches!(err, GraphError::Config(_)));
	}

	#[test]
	fn zoom_is_clamped() {
		assert_eq!(clamp_zoom(10.0), MAX_GLOBAL_ZOOM);
		assert_eq!(clamp_zoom(0.01), MIN_GLOBAL_ZOOM);
	}
}
