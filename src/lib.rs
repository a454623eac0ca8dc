//! Force-directed layout of repositories and their contributors.
//!
//! Records come from a [`data::DataProvider`], [`graph::build`] turns them into
//! a [`graph::Graph`], and a [`physics::Simulation`] lays it out. Node and edge
//! attributes are derived from commit counts by [`scale`] and [`style`];
//! [`render::Scene`] joins everything into plain views for a
//! [`render::Renderer`].

pub mod data;
pub mod error;
pub mod graph;
pub mod interaction;
pub mod physics;
pub mod render;
pub mod scale;
pub mod style;
pub mod util;

pub use error::{ConfigError, GraphError, ProviderError, SimulationError};
