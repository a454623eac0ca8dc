use eframe::egui::{self, Align, Context, Layout};

use commit_constellation::physics::SimulationState;

use super::super::{DataSource, ViewModel};

impl ViewModel {
    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source: &DataSource,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("commit constellation");
                    ui.separator();
                    ui.label(format!("source: {source}"));
                    ui.label(format!("nodes: {}", self.scene.graph().node_count()));
                    ui.label(format!("edges: {}", self.scene.graph().edge_count()));
                    let reload_button = ui.add_enabled(!is_loading, egui::Button::new("Reload data"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Rebuild layout").clicked() {
                        self.rebuild_simulation(self.canvas);
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "visible: {} nodes, {} edges",
                            self.visible_node_count, self.visible_edge_count
                        ));
                    });
                });
            });

        egui::TopBottomPanel::bottom("status_line")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| self.draw_status_line(ui));
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                if is_loading {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Reloading repositories and contributors...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                } else {
                    self.draw_graph(ui);
                }
            });
    }

    fn draw_status_line(&self, ui: &mut egui::Ui) {
        let stats = self.simulation.stats();
        if stats.state == SimulationState::Running {
            ui.spinner();
        }
        ui.label(format!("layout: {}", stats.state.label()));
        ui.label(format!("alpha: {:.3}", stats.alpha));
        ui.label(format!("step: {}", stats.step));
        ui.label(format!("{:.1}s", stats.elapsed.as_secs_f32()));

        let report = self.scene.graph().report();
        if report.total_dropped() > 0 || self.skipped_records > 0 {
            ui.separator();
            ui.label(format!(
                "dropped: {} relationships, {} malformed, {} duplicates, {} unreadable",
                report.dropped_relationships,
                report.malformed_records,
                report.duplicate_nodes,
                self.skipped_records
            ));
        }

        if let Some(status) = &self.status {
            ui.separator();
            ui.colored_label(egui::Color32::from_rgb(200, 90, 60), status.as_str());
        }
    }
}
