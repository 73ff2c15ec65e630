//! egui overlays: the status HUD and the controls window.
//!
//! Both read a [`FrameView`] copy and report what the user asked for as
//! [`Action`]s; the app applies them after the frame.

use crate::app::Action;
use starmap::animation::FrameView;
use starmap::loader::Provenance;
use starmap::{ControlMode, LayoutKind};

/// Everything the HUD shows besides the frame view.
pub struct HudInfo<'a> {
    pub title: &'a str,
    pub points: usize,
    pub provenance: &'a Provenance,
    pub fps: f32,
    pub phase_name: Option<&'a str>,
    pub render_error: Option<&'a str>,
}

pub fn draw_hud(ctx: &egui::Context, info: &HudInfo<'_>, view: &FrameView) {
    egui::Area::new(egui::Id::new("hud"))
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(12.0, 12.0))
        .interactable(false)
        .show(ctx, |ui| {
            ui.label(egui::RichText::new(info.title).strong());
            ui.label(format!("{} points | {:.0} fps", info.points, info.fps));
            match info.provenance {
                Provenance::Source(src) => {
                    ui.label(format!("source: {src}"));
                }
                Provenance::Fallback { .. } => {
                    ui.label("source: synthetic stand-in");
                    // Demo and preview stay silent about the failed fetch.
                    if view.mode == ControlMode::Interactive {
                        ui.colored_label(
                            egui::Color32::from_rgb(240, 190, 90),
                            "Catalogue unavailable. Press L to retry.",
                        );
                    }
                }
            }
            let layout = view.dominant_layout().label();
            match (view.mode, info.phase_name) {
                (ControlMode::ScriptedDemo, Some(name)) => {
                    ui.label(format!("{name} ({:.0}%)", view.phase_progress * 100.0));
                }
                _ => {
                    ui.label(format!("{} | {layout}", view.mode.label()));
                }
            }
            ui.label(format!("zoom {:.2}x", view.camera.zoom));
            if let Some(err) = info.render_error {
                ui.colored_label(egui::Color32::from_rgb(230, 90, 90), err);
            }
        });
}

/// Controls window. Returns the actions requested this frame.
pub fn draw_controls(ctx: &egui::Context, view: &FrameView) -> Vec<Action> {
    let mut actions = Vec::new();

    egui::Window::new("Controls")
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-12.0, 12.0))
        .resizable(false)
        .collapsible(true)
        .show(ctx, |ui| {
            let mut mode = view.mode;
            egui::ComboBox::from_label("Mode")
                .selected_text(mode.label())
                .show_ui(ui, |ui| {
                    for m in [
                        ControlMode::Interactive,
                        ControlMode::ScriptedDemo,
                        ControlMode::StaticPreview,
                    ] {
                        ui.selectable_value(&mut mode, m, m.label());
                    }
                });
            if mode != view.mode {
                actions.push(Action::SetMode(mode));
            }

            ui.horizontal(|ui| {
                let play = if view.playing { "Pause" } else { "Play" };
                if ui
                    .add_enabled(view.mode != ControlMode::StaticPreview, egui::Button::new(play))
                    .clicked()
                {
                    actions.push(Action::TogglePlay);
                }
                if ui.button("Reset view").clicked() {
                    actions.push(Action::ResetCamera);
                }
                if ui.button("Reload").clicked() {
                    actions.push(Action::Reload);
                }
            });

            ui.separator();
            ui.add_enabled_ui(view.mode == ControlMode::Interactive, |ui| {
                ui.label(format!(
                    "{} -> {}",
                    view.manual.from.label(),
                    view.manual.to.label()
                ));
                let mut value = view.manual.value;
                if ui
                    .add(egui::Slider::new(&mut value, 0.0..=1.0).text("Transition"))
                    .changed()
                {
                    actions.push(Action::SetManualValue(value));
                }
                ui.horizontal(|ui| {
                    for kind in LayoutKind::ALL {
                        let selected = view.manual.to == kind;
                        if ui.selectable_label(selected, kind.label()).clicked() {
                            actions.push(Action::SetTarget(kind));
                        }
                    }
                });
                if ui.button("Animate").clicked() {
                    actions.push(Action::TriggerTransition);
                }
            });

            ui.separator();
            let mut observer = view.observer_colors;
            if ui.checkbox(&mut observer, "Observer colours").changed() {
                actions.push(Action::ToggleObserverColors);
            }
            ui.small("Space play/animate | arrows nudge | 1-4 target | M mode | H hide");
        });

    actions
}
