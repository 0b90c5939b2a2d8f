//! Hand-landmark gesture recognition.
//!
//! A per-frame step function over an explicit [`GestureState`]. Thumb/index
//! distance is classified into three zones; a pinch or open hand must be held
//! for a number of frames before it fires, and fires at most once until the
//! hand passes back through the neutral zone.

use log::debug;

use super::config::GraphConfig;
use super::types::HandLandmarks;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GestureState {
	pub pinch_frames: u32,
	pub spread_frames: u32,
	/// Set once the current continuous gesture has fired. Cleared only by a
	/// neutral frame.
	pub armed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandPose {
	Pinching,
	Neutral,
	Open,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GestureEvent {
	Select(String),
	Deselect,
}

/// What the caller should do with the gesture cursor this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CursorUpdate {
	/// Hand lost.
	Clear,
	/// Mirrored, normalized index-tip position.
	Move((f64, f64)),
	/// Sample unusable this frame; keep what was there.
	Keep,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureThresholds {
	pub pinch_distance: f64,
	pub spread_distance: f64,
	pub pinch_frames: u32,
	pub spread_frames: u32,
}

impl Default for GestureThresholds {
	fn default() -> Self {
		Self::from(&GraphConfig::default())
	}
}

impl From<&GraphConfig> for GestureThresholds {
	fn from(config: &GraphConfig) -> Self {
		Self {
			pinch_distance: config.pinch_threshold,
			spread_distance: config.spread_threshold,
			pinch_frames: config.pinch_frames,
			spread_frames: config.spread_frames,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct GestureStep {
	pub state: GestureState,
	pub event: Option<GestureEvent>,
}

/// Mirrored cursor and thumb/index distance, or `None` if the sample does not
/// carry both fingertips.
pub fn read_sample(sample: &HandLandmarks) -> Option<((f64, f64), f64)> {
	let thumb = sample.thumb_tip()?;
	let index = sample.index_tip()?;
	let distance = ((thumb.x - index.x).powi(2) + (thumb.y - index.y).powi(2)).sqrt();
	Some(((1.0 - index.x, index.y), distance))
}

/// Where the gesture cursor goes for this frame's sample.
pub fn cursor(sample: Option<&HandLandmarks>) -> CursorUpdate {
	match sample {
		None => CursorUpdate::Clear,
		Some(hand) => read_sample(hand).map_or(CursorUpdate::Keep, |(c, _)| CursorUpdate::Move(c)),
	}
}

pub fn classify(distance: f64, thresholds: &GestureThresholds) -> HandPose {
	if distance < thresholds.pinch_distance {
		HandPose::Pinching
	} else if distance > thresholds.spread_distance {
		HandPose::Open
	} else {
		HandPose::Neutral
	}
}

/// Advance the recognizer by one landmark frame.
///
/// `hover` is the node under the gesture cursor and `focus` the currently
/// focused node; they decide whether a held pinch selects and whether a held
/// open hand deselects.
pub fn step(
	state: GestureState,
	sample: Option<&HandLandmarks>,
	hover: Option<&str>,
	focus: Option<&str>,
	thresholds: &GestureThresholds,
) -> GestureStep {
	let Some(sample) = sample else {
		return GestureStep {
			state: GestureState {
				pinch_frames: 0,
				spread_frames: 0,
				..state
			},
			event: None,
		};
	};
	let Some((_, distance)) = read_sample(sample) else {
		debug!("incomplete landmark sample ({} points)", sample.0.len());
		return GestureStep { state, event: None };
	};

	let mut next = state;
	let mut event = None;
	match classify(distance, thresholds) {
		HandPose::Pinching => {
			next.pinch_frames = next.pinch_frames.saturating_add(1);
			next.spread_frames = 0;
			if next.pinch_frames > thresholds.pinch_frames && !next.armed {
				if let Some(id) = hover.filter(|&id| Some(id) != focus) {
					event = Some(GestureEvent::Select(id.to_owned()));
				}
				next.armed = true;
			}
		}
		HandPose::Open => {
			next.spread_frames = next.spread_frames.saturating_add(1);
			next.pinch_frames = 0;
			if next.spread_frames > thresholds.spread_frames && !next.armed && focus.is_some() {
				event = Some(GestureEvent::Deselect);
				next.armed = true;
			}
		}
		HandPose::Neutral => {
			next = GestureState::default();
		}
	}

	GestureStep { state: next, event }
}
