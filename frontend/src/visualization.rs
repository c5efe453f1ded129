//! Visualization step: per-column distribution charts driven by the
//! variable metadata (bar chart for categorical, histogram for
//! continuous).

use leptos::prelude::*;

use preplab_core::models::VariableType;
use preplab_core::stats;

use crate::charts;
use crate::state::AppCtx;

#[component]
pub fn VisualizationPage() -> impl IntoView {
    let ctx = AppCtx::expect();
    let selected = RwSignal::new(None::<String>);
    let div_ref = NodeRef::<leptos::html::Div>::new();
    // Header line above the chart; None with a selection means the column
    // had no plottable values.
    let chart_summary = RwSignal::new(None::<String>);
    let chart_empty = RwSignal::new(false);

    let has_data = Signal::derive(move || {
        ctx.data
            .with(|d| !d.rows.is_empty() && !d.columns.is_empty())
    });

    let variable_type = move |column: &str| {
        ctx.data.with_untracked(|d| {
            d.variable_changes
                .get(column)
                .map(|c| c.variable_type)
                .unwrap_or_default()
        })
    };

    Effect::new(move |_| {
        let Some(column) = selected.get() else {
            return;
        };
        let Some(div) = div_ref.get() else {
            return;
        };

        let (summary, var_type) = ctx.data.with_untracked(|d| {
            (
                stats::summarize(&d.rows, &column),
                d.variable_changes
                    .get(&column)
                    .map(|c| c.variable_type)
                    .unwrap_or_default(),
            )
        });

        let plot = match var_type {
            VariableType::Continuous => match stats::histogram(&summary.values) {
                Some(hist) => {
                    chart_empty.set(false);
                    chart_summary.set(Some(format!(
                        "Total: {} | Valid: {} | Missing: {} ({:.1}%) | Min: {:.2} | Max: {:.2} | Mean: {:.2}",
                        summary.total(),
                        hist.valid,
                        summary.missing,
                        summary.missing_percent(),
                        hist.min,
                        hist.max,
                        hist.mean,
                    )));
                    let labels: Vec<String> = hist.bins.iter().map(|b| b.label()).collect();
                    let counts: Vec<usize> = hist.bins.iter().map(|b| b.count).collect();
                    Some(charts::bar_plot(labels, counts, &column, "#10b981"))
                }
                None => {
                    chart_summary.set(None);
                    chart_empty.set(true);
                    None
                }
            },
            VariableType::Categorical => {
                let bins = stats::categorical_bins(&summary.values);
                if bins.is_empty() {
                    chart_summary.set(None);
                    chart_empty.set(true);
                    None
                } else {
                    chart_empty.set(false);
                    chart_summary.set(Some(format!(
                        "Total: {} | Valid: {} | Missing: {} ({:.1}%) | Categories shown: {}",
                        summary.total(),
                        summary.values.len(),
                        summary.missing,
                        summary.missing_percent(),
                        bins.len(),
                    )));
                    let labels: Vec<String> = bins.iter().map(|b| b.label.clone()).collect();
                    let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
                    Some(charts::bar_plot(labels, counts, &column, "#3b82f6"))
                }
            }
        };

        if let Some(plot) = plot {
            let element: &web_sys::HtmlElement = &div;
            charts::render_plot(element, &plot);
        }
    });

    view! {
        <div class="space-y-6">
            <div>
                <h1 class="text-3xl font-bold text-white">"Data Visualizations"</h1>
                <p class="text-sm text-slate-500 mt-1">"Select a variable to visualize its distribution"</p>
            </div>

            {move || if !has_data.get() {
                view! {
                    <div class="text-center py-20 text-slate-500 bg-slate-900 border border-slate-800 rounded-xl">
                        <p class="text-lg">"No Data Available"</p>
                        <p class="text-sm mt-1">"Please upload a dataset first to visualize."</p>
                    </div>
                }.into_any()
            } else {
                view! {
                    <div class="grid gap-3" style="grid-template-columns: repeat(auto-fill, minmax(200px, 1fr));">
                        {ctx.data.with(|d| d.columns.clone()).into_iter().map(|column| {
                            let var_type = variable_type(&column);
                            let is_continuous = var_type == VariableType::Continuous;
                            let col_for_click = column.clone();
                            let is_selected = {
                                let column = column.clone();
                                Signal::derive(move || selected.with(|s| s.as_deref() == Some(column.as_str())))
                            };
                            view! {
                                <button
                                    class=move || format!(
                                        "text-left p-4 rounded-xl text-white font-semibold transition-all hover:scale-[1.02] {} {}",
                                        if is_continuous {
                                            "bg-gradient-to-br from-emerald-600 to-emerald-700"
                                        } else {
                                            "bg-gradient-to-br from-blue-600 to-blue-800"
                                        },
                                        if is_selected.get() { "ring-2 ring-white/60" } else { "" }
                                    )
                                    on:click=move |_| selected.set(Some(col_for_click.clone()))
                                >
                                    <p class="text-sm truncate">{column.clone()}</p>
                                    <p class="text-[11px] opacity-80 font-normal mt-1">
                                        {if is_continuous { "Histogram" } else { "Bar Chart" }}
                                    </p>
                                </button>
                            }
                        }).collect_view()}
                    </div>
                }.into_any()
            }}

            // Chart container
            <div class="bg-slate-900 border border-slate-800 rounded-xl p-6 min-h-[420px]">
                {move || match (selected.get(), chart_empty.get()) {
                    (None, _) => view! {
                        <p class="text-center text-slate-600 py-24">"Select a variable from above to visualize"</p>
                    }.into_any(),
                    (Some(_), true) => view! {
                        <div class="text-center py-24">
                            <p class="text-red-400 font-semibold">"No valid numeric values to display"</p>
                            <p class="text-sm text-slate-500 mt-1">"All values are missing or non-numeric."</p>
                        </div>
                    }.into_any(),
                    (Some(column), false) => view! {
                        <div class="space-y-4">
                            <div>
                                <h3 class="text-lg font-bold text-white">{column}</h3>
                                {move || chart_summary.get().map(|line| view! {
                                    <p class="text-xs text-slate-500 mt-1">{line}</p>
                                })}
                            </div>
                        </div>
                    }.into_any(),
                }}
                <div node_ref=div_ref class="w-full" style="height: 420px;"></div>
            </div>
        </div>
    }
}
