use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Sense, Ui, Vec2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use commit_constellation::physics::{Simulation, SimulationState};
use commit_constellation::render::Emphasis;
use commit_constellation::style::GraphStyle;

use super::super::render_utils::{PainterRenderer, Viewport, draw_background, draw_tooltip};
use super::super::{SearchMatchCache, ViewModel};

/// Resizes smaller than this do not restart the layout.
const CANVAS_RESIZE_TOLERANCE: f32 = 1.0;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<String>>> {
        let search_query = self.search.trim();
        if search_query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.query == search_query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .scene
            .graph()
            .nodes()
            .iter()
            .filter(|node| {
                fuzzy_match_score(&matcher, &node.label, search_query).is_some()
                    || fuzzy_match_score(&matcher, &node.id, search_query).is_some()
            })
            .map(|node| node.id.clone())
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: search_query.to_owned(),
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    /// Rebuilds the layout from scratch for a new canvas size, as a fresh
    /// load would.
    pub(in crate::app) fn rebuild_simulation(&mut self, canvas: Vec2) {
        self.drag.cancel_all(&mut self.simulation);
        self.dragged = None;
        self.simulation.stop();

        let config = self.simulation_config.clone().with_canvas(canvas.x, canvas.y);
        let radii = self.scene.style().radii();
        match Simulation::for_graph(self.scene.graph(), &radii, config) {
            Ok(simulation) => {
                tracing::debug!(width = canvas.x, height = canvas.y, "layout rebuilt");
                self.simulation = simulation;
                self.canvas = canvas;
                self.pan = Vec2::ZERO;
            }
            Err(error) => {
                tracing::warn!(%error, "layout rebuild failed");
                self.status = Some(format!("Layout rebuild failed: {error}"));
            }
        }
    }

    pub(in crate::app) fn restyle(&mut self) {
        let style = GraphStyle::compute(self.scene.graph(), &self.style_config);
        self.simulation.set_radii(&style.radii());
        self.scene.set_style(style);
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());

        let size = rect.size();
        if (size - self.canvas).abs().max_elem() > CANVAS_RESIZE_TOLERANCE && self.dragged.is_none() {
            self.rebuild_simulation(size);
        }

        let painter = ui.painter_at(rect);
        let viewport = Viewport {
            rect,
            pan: self.pan,
            zoom: self.zoom,
            origin: self.canvas * 0.5,
        };
        draw_background(&painter, viewport);

        self.handle_graph_zoom(ui, viewport, &response);
        self.handle_graph_pan(&response);
        let viewport = Viewport {
            pan: self.pan,
            zoom: self.zoom,
            ..viewport
        };

        self.handle_node_drag(ui, viewport, &response);

        if self.simulation.state() == SimulationState::Idle {
            self.simulation.start();
        }
        for _ in 0..self.steps_per_frame {
            if self.simulation.step() != SimulationState::Running {
                break;
            }
        }
        if self.simulation.state() == SimulationState::Running || self.dragged.is_some() {
            ui.ctx().request_repaint();
        }

        let pointer = ui.input(|input| input.pointer.hover_pos());
        self.hovered = match (&self.dragged, pointer) {
            (Some(id), _) => Some(id.clone()),
            (None, Some(pointer)) if rect.contains(pointer) => self.node_at(viewport, pointer),
            _ => None,
        };
        if self.hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            match self.hovered.clone() {
                Some(id) => self.activate_node(ui.ctx(), &id),
                None => self.selected = None,
            }
        }

        let matches = self.cached_search_matches();
        let focus = self.hovered.as_deref().or(self.selected.as_deref());
        let snapshot = self.simulation.snapshot();
        let mut renderer = PainterRenderer::new(&painter, viewport, self.zoom >= 0.8);
        self.scene.render(
            &mut renderer,
            &snapshot,
            Emphasis {
                focus,
                matches: matches.as_deref(),
            },
        );
        self.visible_node_count = renderer.drawn_nodes;
        self.visible_edge_count = renderer.drawn_edges;

        if let Some(node) = self.hovered.as_deref().and_then(|id| self.scene.graph().node(id))
            && let Some(position) = snapshot.position_of(&node.id)
        {
            draw_tooltip(
                &painter,
                viewport.to_screen(position),
                &[
                    node.label.clone(),
                    format!("Commits: {}", node.weight),
                ],
            );
        }

        if self.scene.graph().node_count() == 0 {
            painter.text(
                rect.center() + vec2(0.0, -8.0),
                egui::Align2::CENTER_CENTER,
                "No repositories or contributors to show.",
                egui::FontId::proportional(15.0),
                egui::Color32::DARK_GRAY,
            );
        }
    }
}
