//! Dataset viewer step: a paginated table for tabular data, routed to the
//! image browser or the time-series table when the session calls for it.

use leptos::prelude::*;

use preplab_core::paginate::{cell_text, ROWS_PER_PAGE};

use crate::images::ImageBrowser;
use crate::state::AppCtx;
use crate::timeseries::TimeSeriesViewer;

#[component]
pub fn ViewerPage() -> impl IntoView {
    let ctx = AppCtx::expect();
    let model_type = Signal::derive(move || {
        ctx.data.with(|d| {
            d.upload
                .as_ref()
                .map(|u| u.model_type().to_string())
                .or_else(|| d.selected_model_type.clone())
                .unwrap_or_else(|| "ehr".to_string())
        })
    });

    view! {
        {move || match model_type.get().as_str() {
            "imaging" => view! { <ImageBrowser /> }.into_any(),
            "time_series" => view! { <TimeSeriesViewer /> }.into_any(),
            _ => view! { <DataTable /> }.into_any(),
        }}
    }
}

#[component]
fn DataTable() -> impl IntoView {
    let ctx = AppCtx::expect();

    // Preview sessions upgrade themselves in the background; the request
    // is coalesced, so re-entering the viewer never refetches.
    if let Some(file_id) = ctx.data.with_untracked(|d| {
        (!d.full_dataset_loaded())
            .then(|| d.upload.as_ref().and_then(|u| u.primary_file_id().map(String::from)))
            .flatten()
    }) {
        ctx.spawn_full_fetch(file_id);
    }

    let has_rows = Signal::derive(move || ctx.data.with(|d| !d.rows.is_empty()));

    view! {
        <div class="space-y-6">
            <h1 class="text-3xl font-bold text-white">"Dataset Viewer"</h1>
            {move || if has_rows.get() {
                view! { <PaginatedTable /> }.into_any()
            } else {
                view! {
                    <div class="text-center py-20 text-slate-500 bg-slate-900 border border-slate-800 rounded-xl">
                        <p class="text-lg">"No data available"</p>
                        <p class="text-sm mt-1">"Please upload a dataset first"</p>
                    </div>
                }.into_any()
            }}
        </div>
    }
}

#[component]
fn PaginatedTable() -> impl IntoView {
    let ctx = AppCtx::expect();

    let total_rows = Signal::derive(move || ctx.data.with(|d| d.display_total_rows()));
    let columns = Signal::derive(move || ctx.data.with(|d| d.columns.clone()));

    let goto = move |page: usize| {
        let total = total_rows.get_untracked();
        ctx.pager.update(|p| p.goto(page, total));
    };

    let on_per_change = move |ev: web_sys::Event| {
        if let Ok(per) = event_target_value(&ev).parse::<usize>() {
            ctx.pager.update(|p| p.set_per(per));
        }
    };

    view! {
        <div class="bg-slate-900 border border-slate-800 rounded-xl overflow-hidden">
            <div class="overflow-auto max-h-[65vh]">
                <table class="w-full text-left border-collapse min-w-max text-sm">
                    <thead class="sticky top-0 bg-slate-950 z-10">
                        <tr>
                            <th class="p-3 text-[10px] font-bold text-slate-400 uppercase tracking-wider border-b border-slate-800">"Row"</th>
                            {move || columns.get().into_iter().map(|col| view! {
                                <th class="p-3 text-[10px] font-bold text-slate-400 uppercase tracking-wider border-b border-slate-800 whitespace-nowrap">{col}</th>
                            }).collect_view()}
                        </tr>
                    </thead>
                    <tbody class="divide-y divide-slate-800/50">
                        {move || {
                            let pager = ctx.pager.get();
                            let total = total_rows.get();
                            let (start, end) = pager.slice_bounds(total);
                            ctx.data.with(|d| {
                                let end = end.min(d.rows.len());
                                let start = start.min(end);
                                d.rows[start..end]
                                    .iter()
                                    .enumerate()
                                    .map(|(i, row)| {
                                        let cells: Vec<String> = d
                                            .columns
                                            .iter()
                                            .map(|col| cell_text(row, col))
                                            .collect();
                                        view! {
                                            <tr class="hover:bg-slate-800/30 transition-colors">
                                                <td class="p-3 text-slate-500 font-mono">{start + i + 1}</td>
                                                {cells.into_iter().map(|cell| view! {
                                                    <td class="p-3 text-slate-300 font-mono">{cell}</td>
                                                }).collect_view()}
                                            </tr>
                                        }
                                    })
                                    .collect_view()
                            })
                        }}
                    </tbody>
                </table>
            </div>

            // Pagination controls
            <div class="flex items-center justify-between px-4 py-3 border-t border-slate-800 bg-slate-900/80 flex-wrap gap-3">
                <span class="text-xs text-slate-500">
                    {move || {
                        let pager = ctx.pager.get();
                        let total = total_rows.get();
                        let (start, end) = pager.slice_bounds(total);
                        ctx.data.with(|d| format!(
                            "Showing {}-{} of {} rows × {} columns",
                            if total == 0 { 0 } else { start + 1 },
                            end,
                            total,
                            d.display_total_cols()
                        ))
                    }}
                </span>
                <div class="flex items-center space-x-2">
                    <PagerButton label="First" on_page=Callback::new(move |_| goto(1))
                        disabled=Signal::derive(move || ctx.pager.get().at_first()) />
                    <PagerButton label="Previous" on_page=Callback::new(move |_| {
                            let page = ctx.pager.get_untracked().page;
                            goto(page.saturating_sub(1));
                        })
                        disabled=Signal::derive(move || ctx.pager.get().at_first()) />
                    <span class="px-3 text-xs text-slate-400 font-medium">
                        {move || {
                            let pager = ctx.pager.get();
                            format!("Page {} of {}", pager.page, pager.total_pages(total_rows.get()))
                        }}
                    </span>
                    <PagerButton label="Next" on_page=Callback::new(move |_| {
                            let page = ctx.pager.get_untracked().page;
                            goto(page + 1);
                        })
                        disabled=Signal::derive(move || ctx.pager.get().at_last(total_rows.get())) />
                    <PagerButton label="Last" on_page=Callback::new(move |_| {
                            let total = total_rows.get_untracked();
                            let last = ctx.pager.get_untracked().total_pages(total);
                            goto(last);
                        })
                        disabled=Signal::derive(move || ctx.pager.get().at_last(total_rows.get())) />
                </div>
                <div class="flex items-center space-x-2 text-xs text-slate-500">
                    <span>"Rows per page:"</span>
                    <select
                        class="bg-slate-950 border border-slate-700 rounded px-2 py-1 text-slate-300 outline-none focus:border-blue-500"
                        on:change=on_per_change
                    >
                        {ROWS_PER_PAGE.into_iter().map(|per| view! {
                            <option
                                value=per.to_string()
                                selected=move || ctx.pager.get().per == per
                            >
                                {per.to_string()}
                            </option>
                        }).collect_view()}
                    </select>
                </div>
            </div>
        </div>
    }
}

#[component]
fn PagerButton(
    label: &'static str,
    on_page: Callback<()>,
    disabled: Signal<bool>,
) -> impl IntoView {
    view! {
        <button
            class="px-3 py-1.5 text-xs rounded-lg border border-slate-700 text-slate-300 hover:bg-slate-800 disabled:opacity-40 disabled:cursor-not-allowed transition-colors"
            disabled=move || disabled.get()
            on:click=move |_| on_page.run(())
        >
            {label}
        </button>
    }
}
