use eframe::egui::{RichText, Ui};
use egui_plot::{HLine, Line, LineStyle as PlotLineStyle, Plot, PlotPoint, PlotPoints, Points, Text};

use trend_metric::color::stroke_color;
use trend_metric::engine::annotation::AnnotationLine;
use trend_metric::engine::style::{LabelPosition, LineStyle};
use trend_metric::pipeline::Phase;
use trend_metric::state::AppState;

// ---------------------------------------------------------------------------
// Trend plot (central panel)
// ---------------------------------------------------------------------------

/// Render the observation series, its trend line and the overlays.
///
/// The plot is rebuilt from the current result every frame, so swapping the
/// result never leaves a stale chart behind.
pub fn trend_plot(ui: &mut Ui, state: &AppState) {
    let result = match state.result() {
        Some(result) => result,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| match state.phase() {
                None => {
                    ui.heading("Open a fixture to view a trend  (File → Open…)");
                }
                Some(Phase::Failed) | Some(Phase::AwaitingSelection) => {
                    ui.label(RichText::new("No data").weak());
                }
                Some(_) => {
                    ui.spinner();
                }
            });
            return;
        }
    };

    let theme = &state.theme;
    let n = result.series.len();

    Plot::new("trend_plot")
        .legend(egui_plot::Legend::default())
        .show_axes(false)
        .include_y(0.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            // ---- Observations: x is the 1-based position ----
            let points: Vec<[f64; 2]> = result
                .series
                .iter()
                .enumerate()
                .map(|(i, o)| [(i + 1) as f64, o.value])
                .collect();

            plot_ui.line(
                Line::new(PlotPoints::from(points.clone()))
                    .name("Observations")
                    .color(theme.series)
                    .fill(0.0)
                    .width(theme.line_width),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(points))
                    .color(theme.point)
                    .radius(theme.point_radius),
            );

            // ---- Line of best fit ----
            if let Some(regression) = &result.regression {
                let fitted: PlotPoints = regression
                    .points()
                    .iter()
                    .enumerate()
                    .map(|(i, &y)| [(i + 1) as f64, y])
                    .collect();
                plot_ui.line(
                    Line::new(fitted)
                        .name(&regression.label)
                        .color(stroke_color(&regression.style))
                        .width(regression.style.width)
                        .style(plot_style(&regression.style)),
                );
            }

            // ---- Mean line and deviation band ----
            for annotation in result.annotations.iter() {
                let color = stroke_color(&annotation.style);
                plot_ui.hline(
                    HLine::new(annotation.value)
                        .name(annotation.key)
                        .color(color)
                        .width(annotation.style.width)
                        .style(plot_style(&annotation.style)),
                );
                plot_ui.text(
                    Text::new(label_anchor(annotation, n), annotation.label.clone()).color(color),
                );
            }
        });
}

fn plot_style(style: &LineStyle) -> PlotLineStyle {
    match style.dash {
        Some((dash, _gap)) => PlotLineStyle::Dashed { length: dash },
        None => PlotLineStyle::Solid,
    }
}

/// Where along the x axis an overlay's label is drawn.
fn label_anchor(annotation: &AnnotationLine, n: usize) -> PlotPoint {
    let last = n.max(1) as f64;
    let x = match annotation.label_position {
        LabelPosition::Start => 1.0,
        LabelPosition::Center => (1.0 + last) / 2.0,
        LabelPosition::End => last,
    };
    PlotPoint::new(x, annotation.value)
}
