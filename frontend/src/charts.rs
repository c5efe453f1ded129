//! Plotly glue: build a plot with the `plotly` crate, serialize it, and
//! hand it to the global `Plotly.newPlot` loaded from index.html.

use plotly::{
    common::{Marker, Title},
    layout::{Axis, Margin},
    Bar, Layout, Plot,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsValue;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = Plotly, js_name = newPlot)]
    fn new_plot(root: &JsValue, data: &JsValue, layout: &JsValue, config: &JsValue);
}

pub fn render_plot(div: &web_sys::HtmlElement, plot: &Plot) {
    let json_str = plot.to_json();
    match js_sys::JSON::parse(&json_str) {
        Ok(js_value) => {
            let data =
                js_sys::Reflect::get(&js_value, &"data".into()).unwrap_or(JsValue::UNDEFINED);
            let layout =
                js_sys::Reflect::get(&js_value, &"layout".into()).unwrap_or(JsValue::UNDEFINED);
            let config =
                js_sys::Reflect::get(&js_value, &"config".into()).unwrap_or(JsValue::UNDEFINED);
            new_plot(&JsValue::from(div.clone()), &data, &layout, &config);
        }
        Err(_) => log::error!("failed to parse Plotly JSON"),
    }
}

fn dark_layout(x_title: &str, y_title: &str) -> Layout {
    Layout::new()
        .margin(Margin::new().left(60).right(30).top(30).bottom(90))
        .show_legend(false)
        .paper_background_color("rgba(0,0,0,0)")
        .plot_background_color("rgba(0,0,0,0)")
        .font(plotly::common::Font::new().color("#94a3b8"))
        .x_axis(
            Axis::new()
                .title(Title::from(x_title))
                .show_grid(false)
                .tick_angle(45.0),
        )
        .y_axis(
            Axis::new()
                .title(Title::from(y_title))
                .show_grid(true)
                .grid_color("#1e293b"),
        )
}

/// Frequency bar chart shared by the categorical and histogram views;
/// the caller has already computed labels and counts.
pub fn bar_plot(labels: Vec<String>, counts: Vec<usize>, x_title: &str, color: &'static str) -> Plot {
    let mut plot = Plot::new();
    plot.set_layout(dark_layout(x_title, "Count"));
    let trace = Bar::new(labels, counts).marker(Marker::new().color(color));
    plot.add_trace(trace);
    plot
}
