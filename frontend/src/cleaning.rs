//! Cleaning step: per-column quality summary and the
//! categorical/continuous classification editor that feeds chart
//! selection downstream.

use leptos::prelude::*;

use preplab_core::models::{VariableChange, VariableType};
use preplab_core::stats;
use preplab_core::store::keys;

use crate::state::AppCtx;
use crate::storage;

#[component]
pub fn CleaningPage() -> impl IntoView {
    let ctx = AppCtx::expect();

    let has_data = Signal::derive(move || ctx.data.with(|d| !d.rows.is_empty()));

    let set_type = move |column: String, var_type: VariableType| {
        ctx.data.update(|d| {
            d.variable_changes
                .entry(column.clone())
                .or_insert_with(VariableChange::default)
                .variable_type = var_type;
            d.data_modified = true;
            storage::store().save_json(keys::VARIABLE_CHANGES, &d.variable_changes);
            storage::store().save_string(keys::DATA_MODIFIED, "true");
        });
        log::info!("classified {column} as {var_type:?}");
    };

    view! {
        <div class="space-y-6">
            <div>
                <h1 class="text-3xl font-bold text-white">"Data Cleaning"</h1>
                <p class="text-sm text-slate-500 mt-1">
                    "Review each variable and classify it as categorical or continuous"
                </p>
            </div>

            {move || if !has_data.get() {
                view! {
                    <div class="text-center py-20 text-slate-500 bg-slate-900 border border-slate-800 rounded-xl">
                        <p class="text-lg">"No data available"</p>
                        <p class="text-sm mt-1">"Please upload a dataset first"</p>
                    </div>
                }.into_any()
            } else {
                view! {
                    <div class="bg-slate-900 border border-slate-800 rounded-xl overflow-hidden">
                        <table class="w-full text-left border-collapse text-sm">
                            <thead class="bg-slate-950">
                                <tr>
                                    <th class="p-4 text-[10px] font-bold text-slate-400 uppercase tracking-wider">"Variable"</th>
                                    <th class="p-4 text-[10px] font-bold text-slate-400 uppercase tracking-wider">"Valid"</th>
                                    <th class="p-4 text-[10px] font-bold text-slate-400 uppercase tracking-wider">"Missing"</th>
                                    <th class="p-4 text-[10px] font-bold text-slate-400 uppercase tracking-wider">"Distinct"</th>
                                    <th class="p-4 text-[10px] font-bold text-slate-400 uppercase tracking-wider">"Type"</th>
                                </tr>
                            </thead>
                            <tbody class="divide-y divide-slate-800/50">
                                {move || ctx.data.with(|d| {
                                    d.columns.iter().map(|column| {
                                        let summary = stats::summarize(&d.rows, column);
                                        let distinct = {
                                            let mut labels: Vec<String> = summary
                                                .values
                                                .iter()
                                                .map(stats::value_text)
                                                .collect();
                                            labels.sort();
                                            labels.dedup();
                                            labels.len()
                                        };
                                        let current = d
                                            .variable_changes
                                            .get(column)
                                            .map(|c| c.variable_type)
                                            .unwrap_or_default();
                                        let missing_pct = summary.missing_percent();
                                        let column = column.clone();
                                        view! {
                                            <tr class="hover:bg-slate-800/30 transition-colors">
                                                <td class="p-4 font-medium text-white">{column.clone()}</td>
                                                <td class="p-4 text-slate-300 font-mono">{summary.values.len()}</td>
                                                <td class="p-4 font-mono">
                                                    <span class={if summary.missing > 0 { "text-yellow-400" } else { "text-slate-500" }}>
                                                        {format!("{} ({:.1}%)", summary.missing, missing_pct)}
                                                    </span>
                                                </td>
                                                <td class="p-4 text-slate-300 font-mono">{distinct}</td>
                                                <td class="p-4">
                                                    <TypeToggle
                                                        current
                                                        on_select=Callback::new({
                                                            let column = column.clone();
                                                            move |var_type| set_type(column.clone(), var_type)
                                                        })
                                                    />
                                                </td>
                                            </tr>
                                        }
                                    }).collect_view()
                                })}
                            </tbody>
                        </table>
                    </div>
                }.into_any()
            }}
        </div>
    }
}

#[component]
fn TypeToggle(current: VariableType, on_select: Callback<VariableType>) -> impl IntoView {
    view! {
        <div class="flex rounded-lg overflow-hidden border border-slate-700 w-fit">
            {[
                (VariableType::Categorical, "Categorical"),
                (VariableType::Continuous, "Continuous"),
            ].into_iter().map(|(var_type, label)| {
                let active = current == var_type;
                view! {
                    <button
                        class=format!(
                            "px-3 py-1.5 text-xs font-medium transition-colors {}",
                            if active {
                                "bg-blue-600 text-white"
                            } else {
                                "bg-slate-900 text-slate-400 hover:text-white"
                            }
                        )
                        on:click=move |_| on_select.run(var_type)
                    >
                        {label}
                    </button>
                }
            }).collect_view()}
        </div>
    }
}
