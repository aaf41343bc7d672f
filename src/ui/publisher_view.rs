use eframe::egui::{self, RichText};

use super::common::{activity_log, create_frame, UiColors};
use super::state::PanelState;
use crate::publisher::PublisherForm;

/// Clicks on the publisher page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherAction {
    /// Publish the input of the target at this index
    Publish(usize),
    ClearLog,
}

pub fn render(
    ui: &mut egui::Ui,
    form: &mut PublisherForm,
    state: &PanelState,
) -> Vec<PublisherAction> {
    let mut actions = Vec::new();
    let mut quick_values = Vec::new();

    egui::Grid::new("publish_targets")
        .num_columns(4)
        .spacing([8.0, 6.0])
        .show(ui, |ui| {
            for (index, input) in form.inputs_mut().iter_mut().enumerate() {
                ui.vertical(|ui| {
                    ui.label(RichText::new(&input.target.label).strong());
                    ui.colored_label(UiColors::TEXT_DIM, input.target.topic.as_str());
                });

                ui.add(
                    egui::TextEdit::singleline(&mut input.value)
                        .hint_text("value")
                        .desired_width(160.0),
                );

                ui.horizontal(|ui| {
                    for value in &input.target.quick_values {
                        if ui.small_button(value.as_str()).clicked() {
                            quick_values.push((index, value.clone()));
                        }
                    }
                });

                if ui.button("Publish").clicked() {
                    actions.push(PublisherAction::Publish(index));
                }
                ui.end_row();
            }
        });

    for (index, value) in quick_values {
        form.set_quick_value(index, &value);
    }

    ui.add_space(8.0);
    create_frame(UiColors::INNER_BG, UiColors::BORDER).show(ui, |ui| {
        ui.horizontal(|ui| {
            ui.heading("Activity Log");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Clear").clicked() {
                    actions.push(PublisherAction::ClearLog);
                }
            });
        });
        let height = ui.available_height() - 8.0;
        activity_log(ui, state, height.max(120.0));
    });

    actions
}
