use eframe::egui::{self, Ui};

use commit_constellation::physics::{ForceConfig, RepulsionMode};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search (repository or contributor)")
            .on_hover_text("Fuzzy-match node names; everything else is dimmed.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();
        ui.label("Layout");
        ui.horizontal_wrapped(|ui| {
            if ui.button("Reheat").clicked() {
                self.simulation.reheat(1.0);
            }
            if ui.button("Stop").clicked() {
                self.simulation.stop();
            }
            if ui.button("Restart").clicked() {
                self.simulation.restart();
            }
            if ui.button("Reset view").clicked() {
                self.pan = egui::Vec2::ZERO;
                self.zoom = 1.0;
            }
        });
        ui.add(egui::Slider::new(&mut self.steps_per_frame, 1..=8).text("Steps per frame"))
            .on_hover_text("Simulation ticks per drawn frame.");

        ui.separator();
        ui.label("Forces");
        let mut forces = self.simulation.config().forces;
        let mut changed = false;
        changed |= ui
            .add(egui::Slider::new(&mut forces.charge_strength, -60.0..=0.0).text("Charge"))
            .on_hover_text("Negative values push nodes apart.")
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut forces.link_distance, 0.0..=200.0).text("Link distance"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut forces.link_strength, 0.0..=1.0).text("Link strength"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut forces.collision_strength, 0.0..=1.0).text("Collision"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut forces.center_strength, 0.0..=1.0).text("Centering"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut forces.axis_strength, 0.0..=1.0).text("Axis pull"))
            .changed();

        ui.horizontal_wrapped(|ui| {
            ui.label("Repulsion:");
            for (mode, label) in [
                (RepulsionMode::Auto, "Auto"),
                (RepulsionMode::Exact, "Exact"),
                (RepulsionMode::BarnesHut, "Barnes-Hut"),
            ] {
                changed |= ui.selectable_value(&mut forces.repulsion, mode, label).changed();
            }
        });

        if ui.button("Default forces").clicked() {
            forces = ForceConfig::default();
            changed = true;
        }
        if changed {
            self.simulation.configure(|current| *current = forces);
        }

        ui.separator();
        ui.label("Style");
        if ui
            .checkbox(&mut self.style_config.suppress_strays, "Cap outliers")
            .on_hover_text("Scale against the upper quartile fence so one busy repository cannot shrink the rest.")
            .changed()
        {
            self.restyle();
        }
    }
}
