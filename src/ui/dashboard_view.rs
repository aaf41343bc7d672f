use eframe::egui::{self, vec2, Color32, RichText, Sense};

use super::common::{create_frame, UiColors};
use super::state::PanelState;
use crate::dashboard::{LedColor, Sensor, SensorDisplay, TopicRegistry};

const CARD_WIDTH: f32 = 200.0;

/// Renders the four sensor cards of the subscriber page.
pub fn render(ui: &mut egui::Ui, state: &PanelState) {
    let registry = TopicRegistry::default();
    ui.horizontal_wrapped(|ui| {
        for sensor in registry.sensors() {
            sensor_card(ui, state, sensor, registry.topic(sensor));
        }
    });
}

fn value_color(display: &SensorDisplay) -> Color32 {
    match display {
        SensorDisplay::Temperature(_) => Color32::WHITE,
        SensorDisplay::Led(LedColor::Red) => UiColors::INACTIVE,
        SensorDisplay::Led(LedColor::Green) => UiColors::ACTIVE,
        // attention value in red, resting value in green
        other if other.is_active() => UiColors::INACTIVE,
        _ => UiColors::ACTIVE,
    }
}

fn sensor_card(ui: &mut egui::Ui, state: &PanelState, sensor: Sensor, topic: &str) {
    create_frame(UiColors::INNER_BG, UiColors::BORDER).show(ui, |ui| {
        ui.set_width(CARD_WIDTH);
        ui.vertical(|ui| {
            ui.label(RichText::new(sensor.to_string()).strong());
            ui.colored_label(UiColors::TEXT_DIM, topic);
            ui.add_space(6.0);

            match state.card(sensor) {
                Some(card) => {
                    ui.horizontal(|ui| {
                        if let SensorDisplay::Led(_) = card.display {
                            led_preview(ui, value_color(&card.display));
                        }
                        ui.label(
                            RichText::new(card.display.label())
                                .size(24.0)
                                .color(value_color(&card.display)),
                        );
                    });
                    ui.colored_label(
                        UiColors::TEXT_DIM,
                        format!("Update: {}", card.updated.format("%H:%M:%S")),
                    );
                }
                None => {
                    ui.label(RichText::new("--").size(24.0));
                    ui.colored_label(UiColors::TEXT_DIM, "Waiting for data...");
                }
            }
        });
    });
}

fn led_preview(ui: &mut egui::Ui, color: Color32) {
    let (rect, _) = ui.allocate_exact_size(vec2(20.0, 20.0), Sense::hover());
    ui.painter().circle_filled(rect.center(), 9.0, color);
}
