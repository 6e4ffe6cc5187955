//! Top toolbar. Widgets only report what was clicked; `CarouselApp`
//! applies the actions after the panel is drawn.

use eframe::egui;

use crate::core::composer::Labels;
use crate::core::timeline::TimingStyle;

#[derive(Clone, Debug, PartialEq)]
pub enum ToolbarAction {
    Upload,
    SaveImage,
    SaveVideo,
    StopRecording,
    Reset,
    ToggleTheme,
    SetLabels(Labels),
    SetStyle(TimingStyle),
    SetPadding(f32),
}

/// Toolbar inputs for one frame
pub struct ToolbarState<'a> {
    pub labels: &'a Labels,
    pub style: TimingStyle,
    pub padding: f32,
    pub dark_mode: bool,
    pub recording: bool,
    pub has_items: bool,
}

pub fn render(ctx: &egui::Context, state: &ToolbarState<'_>) -> Vec<ToolbarAction> {
    let mut actions = Vec::new();

    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.horizontal_wrapped(|ui| {
            let mut labels = state.labels.clone();
            let left = ui.add(
                egui::TextEdit::singleline(&mut labels.left)
                    .hint_text("Left text")
                    .desired_width(160.0),
            );
            let right = ui.add(
                egui::TextEdit::singleline(&mut labels.right)
                    .hint_text("Right text")
                    .desired_width(200.0),
            );
            if left.changed() || right.changed() {
                actions.push(ToolbarAction::SetLabels(labels));
            }

            ui.separator();

            let idle = !state.recording;
            if ui.add_enabled(idle, egui::Button::new("Upload")).clicked() {
                actions.push(ToolbarAction::Upload);
            }
            if ui.add_enabled(idle, egui::Button::new("Save Image")).clicked() {
                actions.push(ToolbarAction::SaveImage);
            }
            if state.recording {
                if ui.button("Stop").clicked() {
                    actions.push(ToolbarAction::StopRecording);
                }
            } else if ui
                .add_enabled(state.has_items, egui::Button::new("Save Video"))
                .on_disabled_hover_text("Add images first")
                .clicked()
            {
                actions.push(ToolbarAction::SaveVideo);
            }
            if ui.button("Reset").clicked() {
                actions.push(ToolbarAction::Reset);
            }

            ui.separator();

            let theme_label = if state.dark_mode { "Light mode" } else { "Dark mode" };
            if ui.button(theme_label).clicked() {
                actions.push(ToolbarAction::ToggleTheme);
            }

            ui.add_enabled_ui(idle, |ui| {
                let mut style = state.style;
                egui::ComboBox::from_id_salt("timing_style")
                    .selected_text(style_name(style))
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut style, TimingStyle::HoldAndReverse, style_name(TimingStyle::HoldAndReverse));
                        ui.selectable_value(&mut style, TimingStyle::PanAndGlide, style_name(TimingStyle::PanAndGlide));
                    });
                if style != state.style {
                    actions.push(ToolbarAction::SetStyle(style));
                }

                let mut padding = state.padding;
                if ui
                    .add(egui::Slider::new(&mut padding, 0.0..=120.0).text("padding").step_by(1.0))
                    .changed()
                {
                    actions.push(ToolbarAction::SetPadding(padding));
                }
            });
        });
    });

    actions
}

fn style_name(style: TimingStyle) -> &'static str {
    match style {
        TimingStyle::HoldAndReverse => "Hold & reverse",
        TimingStyle::PanAndGlide => "Pan & glide",
    }
}
