use eframe::egui::{self, OpenUrl, Pos2, Ui};

use commit_constellation::graph::NodeKind;

use super::super::ViewModel;
use super::super::render_utils::Viewport;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        viewport: Viewport,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| viewport.rect.center());
        let world_before = viewport.to_world(pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.1, 8.0);
        self.pan = pointer - viewport.rect.center() - (world_before - viewport.origin) * self.zoom;
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    /// Topmost node under the pointer; later nodes are drawn above earlier ones.
    pub(in crate::app) fn node_at(&self, viewport: Viewport, pointer: Pos2) -> Option<String> {
        let bodies = self.simulation.bodies();
        let radii = &self.scene.style().nodes;
        self.simulation
            .ids()
            .iter()
            .zip(bodies)
            .zip(radii)
            .rev()
            .find(|((_, body), style)| {
                let position = viewport.to_screen(body.position);
                position.distance(pointer) <= viewport.screen_radius(style.radius) + 2.0
            })
            .map(|((id, _), _)| id.clone())
    }

    /// Primary drags pin the node under the pointer and carry it along.
    pub(in crate::app) fn handle_node_drag(
        &mut self,
        ui: &Ui,
        viewport: Viewport,
        response: &egui::Response,
    ) {
        let pointer = ui.input(|input| input.pointer.interact_pos());

        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(pointer) = pointer
            && let Some(id) = self.node_at(viewport, pointer)
            && self.drag.on_drag_start(&mut self.simulation, &id)
        {
            self.dragged = Some(id);
        }

        if let Some(id) = &self.dragged {
            if response.dragged_by(egui::PointerButton::Primary)
                && let Some(pointer) = pointer
            {
                self.drag
                    .on_drag_move(&mut self.simulation, id, viewport.to_world(pointer));
            }

            if response.drag_stopped() || !ui.input(|input| input.pointer.primary_down()) {
                self.drag.on_drag_end(&mut self.simulation, id);
                self.dragged = None;
            }
        }
    }

    /// Repositories open their page; users open the profile behind their
    /// sample commit, resolved on demand.
    pub(in crate::app) fn activate_node(&mut self, ctx: &egui::Context, id: &str) {
        self.selected = Some(id.to_owned());

        let Some(node) = self.scene.graph().node(id) else {
            return;
        };

        match node.kind {
            NodeKind::Repository => {
                ctx.open_url(OpenUrl::new_tab(format!("https://github.com/{}", node.id)));
                self.status = None;
            }
            NodeKind::User => {
                let Some(reference) = node.commit_reference.clone() else {
                    self.status = Some(format!("{} has no known commit to resolve", node.label));
                    return;
                };
                match self.provider.resolve_profile(&reference) {
                    Ok(profile) => {
                        ctx.open_url(OpenUrl::new_tab(profile.profile_url));
                        self.status = None;
                    }
                    Err(error) => {
                        tracing::warn!(%reference, %error, "profile resolution failed");
                        self.status = Some(format!("Could not resolve profile: {error}"));
                    }
                }
            }
        }
    }
}
