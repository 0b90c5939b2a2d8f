mod component;
pub mod config;
pub mod error;
pub mod focus;
pub mod gesture;
pub mod layout;
pub mod reconcile;
mod render;
pub mod session;
pub mod state;
pub mod store;
pub mod types;

pub use component::{ConceptGraphCanvas, GraphHandle};
pub use config::GraphConfig;
pub use error::{GraphError, Result};
pub use layout::LayoutMode;
pub use session::Session;
pub use types::{
	ConceptEvent, GraphLink, GraphNode, HandLandmarks, Landmark, RelationshipEvent,
	SessionSnapshot, UpdateEvent,
};
