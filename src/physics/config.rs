use std::fs;
use std::path::Path;

use eframe::egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How many-body repulsion is evaluated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepulsionMode {
    /// Exact below `exact_repulsion_limit` nodes, Barnes-Hut above.
    #[default]
    Auto,
    /// Every pair, `O(n^2)` per step.
    Exact,
    /// Quadtree approximation, `O(n log n)` per step.
    BarnesHut,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Negative values repel.
    pub charge_strength: f32,
    pub charge_distance_min: f32,
    /// `None` leaves repulsion unbounded in range.
    pub charge_distance_max: Option<f32>,
    pub barnes_hut_theta: f32,
    pub repulsion: RepulsionMode,
    pub exact_repulsion_limit: usize,
    pub link_strength: f32,
    /// Added to the two endpoint radii to give each edge's rest length.
    pub link_distance: f32,
    pub center_strength: f32,
    pub collision_strength: f32,
    /// Added to each node's visual radius to give its collision radius.
    pub collision_margin: f32,
    pub axis_strength: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            charge_strength: -4.0,
            charge_distance_min: 1.0,
            charge_distance_max: None,
            barnes_hut_theta: 0.9,
            repulsion: RepulsionMode::Auto,
            exact_repulsion_limit: 2_000,
            link_strength: 0.5,
            link_distance: 30.0,
            center_strength: 1.0,
            collision_strength: 1.0,
            collision_margin: 1.0,
            axis_strength: 0.1,
        }
    }
}

impl ForceConfig {
    pub fn sanitized(mut self) -> Self {
        self.charge_strength = self.charge_strength.clamp(-10_000.0, 10_000.0);
        self.charge_distance_min = self.charge_distance_min.clamp(0.0, 1_000.0);
        self.charge_distance_max = self
            .charge_distance_max
            .filter(|max| max.is_finite() && *max > self.charge_distance_min);
        self.barnes_hut_theta = self.barnes_hut_theta.clamp(0.1, 2.0);
        self.exact_repulsion_limit = self.exact_repulsion_limit.min(20_000);
        self.link_strength = self.link_strength.clamp(0.0, 1.0);
        self.link_distance = self.link_distance.clamp(0.0, 10_000.0);
        self.center_strength = self.center_strength.clamp(0.0, 1.0);
        self.collision_strength = self.collision_strength.clamp(0.0, 1.0);
        self.collision_margin = self.collision_margin.clamp(0.0, 100.0);
        self.axis_strength = self.axis_strength.clamp(0.0, 1.0);
        self
    }

    pub(super) fn uses_exact_repulsion(&self, node_count: usize) -> bool {
        match self.repulsion {
            RepulsionMode::Exact => true,
            RepulsionMode::BarnesHut => false,
            RepulsionMode::Auto => node_count < self.exact_repulsion_limit,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub width: f32,
    pub height: f32,
    pub alpha: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub alpha_target: f32,
    pub velocity_decay: f32,
    /// Alpha a settled simulation is raised to when pins change.
    pub reheat_alpha: f32,
    pub max_steps: usize,
    /// Wall-clock budget per run; `None` relies on `max_steps` alone.
    pub max_duration_secs: Option<f32>,
    /// Publish a snapshot every this many steps (terminal steps always publish).
    pub publish_every: usize,
    /// Fixed targets of the axis forces; the canvas center when unset.
    pub axis_target: Option<[f32; 2]>,
    pub forces: ForceConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            width: 960.0,
            height: 600.0,
            alpha: 1.0,
            alpha_min,
            // Reaches alpha_min from 1 in 300 steps.
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            alpha_target: 0.0,
            velocity_decay: 0.4,
            reheat_alpha: 0.3,
            max_steps: 3_000,
            max_duration_secs: Some(20.0),
            publish_every: 1,
            axis_target: None,
            forces: ForceConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn with_canvas(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(raw).map(Self::sanitized)
    }

    pub fn sanitized(mut self) -> Self {
        self.width = if self.width.is_finite() { self.width.max(1.0) } else { 960.0 };
        self.height = if self.height.is_finite() { self.height.max(1.0) } else { 600.0 };
        self.alpha = self.alpha.clamp(0.0, 1.0);
        self.alpha_min = self.alpha_min.clamp(0.0, 1.0);
        self.alpha_decay = self.alpha_decay.clamp(0.0, 1.0);
        self.alpha_target = self.alpha_target.clamp(0.0, 1.0);
        self.velocity_decay = self.velocity_decay.clamp(0.0, 1.0);
        self.reheat_alpha = self.reheat_alpha.clamp(self.alpha_min, 1.0);
        self.max_steps = self.max_steps.max(1);
        self.max_duration_secs = self
            .max_duration_secs
            .filter(|secs| secs.is_finite() && *secs > 0.0);
        self.publish_every = self.publish_every.max(1);
        self.forces = self.forces.sanitized();
        self
    }

    pub fn center(&self) -> Vec2 {
        vec2(self.width * 0.5, self.height * 0.5)
    }

    pub fn axis_target(&self) -> Vec2 {
        self.axis_target
            .map(|[x, y]| vec2(x, y))
            .unwrap_or_else(|| self.center())
    }
}
