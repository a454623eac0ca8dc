use eframe::egui::{self, RichText, Ui};

use commit_constellation::graph::NodeKind;
use commit_constellation::util::format_commits;

use super::super::ViewModel;

const MAX_RELATED_ROWS: usize = 40;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone().or_else(|| self.hovered.clone()) else {
            ui.label("Hover or click a node in the graph.");
            return;
        };

        let graph = self.scene.graph();
        let Some(node) = graph.node(&selected_id) else {
            ui.label("Selected node no longer exists in the graph.");
            return;
        };

        ui.label(RichText::new(node.label.as_str()).strong());
        ui.small(node.id.as_str());
        ui.add_space(6.0);
        ui.label(format!("{} with {}", node.kind.label(), format_commits(node.weight)));
        if let Some(body) = self.simulation.body(&node.id) {
            ui.label(format!(
                "Position: ({:.0}, {:.0}){}",
                body.position.x,
                body.position.y,
                if body.pin.is_some() { ", pinned" } else { "" }
            ));
        }

        let mut related = graph
            .edges()
            .iter()
            .filter_map(|edge| {
                let other = if edge.source == node.id {
                    &edge.target
                } else if edge.target == node.id {
                    &edge.source
                } else {
                    return None;
                };
                graph.node(other).map(|other| (other, edge.weight))
            })
            .collect::<Vec<_>>();
        related.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.label.cmp(&b.0.label)));

        ui.separator();
        let heading = match node.kind {
            NodeKind::Repository => "Contributors",
            NodeKind::User => "Repositories",
        };
        ui.label(RichText::new(format!("{heading} ({})", related.len())).strong());

        let mut clicked = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (other, weight) in related.iter().take(MAX_RELATED_ROWS) {
                    ui.horizontal(|ui| {
                        if ui.link(other.label.as_str()).clicked() {
                            clicked = Some(other.id.clone());
                        }
                        ui.small(format_commits(*weight));
                    });
                }
                if related.len() > MAX_RELATED_ROWS {
                    ui.small(format!("and {} more", related.len() - MAX_RELATED_ROWS));
                }
            });

        if let Some(id) = clicked {
            self.selected = Some(id);
        }
    }
}
