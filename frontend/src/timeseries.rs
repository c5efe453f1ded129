//! Time-series viewer: the signal table plus the sampling-frequency
//! editor and its derived duration.

use leptos::prelude::*;
use leptos::task::spawn_local;

use preplab_core::store::keys;
use preplab_core::TimeSeriesSession;
use serde_json::Value;

use crate::state::AppCtx;
use crate::storage;

#[component]
pub fn TimeSeriesViewer() -> impl IntoView {
    let ctx = AppCtx::expect();
    let freq_error = RwSignal::new(None::<String>);
    let freq_input = RwSignal::new(String::new());

    // Build the session lazily: rows are usually already cached by the
    // upload flow; a restored session without rows loads them first.
    if ctx.ts_session.with_untracked(Option::is_none) {
        let have_rows = ctx.data.with_untracked(|d| !d.rows.is_empty());
        if have_rows {
            initialize_session(ctx, None);
        } else if let Some(file_id) = ctx
            .data
            .with_untracked(|d| d.upload.as_ref().and_then(|u| u.primary_file_id().map(String::from)))
        {
            spawn_local(async move {
                if ctx.load_full_dataset(file_id.clone()).await {
                    initialize_session(ctx, Some(file_id));
                }
            });
        }
    }

    let apply_frequency = move |raw: String| {
        let parsed = raw.trim().parse::<f64>();
        let result = ctx
            .ts_session
            .try_update(|session| {
                let Some(session) = session.as_mut() else {
                    return Err("Time series session not initialized".to_string());
                };
                match parsed {
                    Ok(freq) => session
                        .set_frequency(freq)
                        .map_err(|e| e.to_string())
                        .map(|_| session.clone()),
                    Err(_) => Err("Frequency must be a positive number".to_string()),
                }
            })
            .unwrap_or_else(|| Err("Time series session not initialized".to_string()));

        match result {
            Ok(session) => {
                freq_error.set(None);
                storage::store().save_json(keys::TIME_SERIES_DATA, &session);
                log::info!("frequency updated to {} Hz", session.frequency);
            }
            Err(err) => freq_error.set(Some(err)),
        }
    };

    view! {
        <div class="space-y-6">
            <h1 class="text-3xl font-bold text-white">"Time Series Dataset"</h1>
            {move || match ctx.ts_session.get() {
                None => view! {
                    <div class="text-center py-20 text-slate-400">
                        <div class="w-10 h-10 mx-auto border-4 border-slate-700 border-t-blue-500 rounded-full animate-spin mb-4"></div>
                        <p>"Loading time series data..."</p>
                    </div>
                }.into_any(),
                Some(session) => view! {
                    // Session stat chips
                    <div class="flex flex-wrap gap-3 items-center">
                        <StatChip label="Sample Count" value=session.sample_count.to_string() />
                        <div class="px-4 py-2.5 bg-slate-900 border border-slate-800 rounded-xl flex items-center space-x-2 text-sm">
                            <span class="text-slate-400 font-medium">"Frequency:"</span>
                            <input
                                type="number"
                                step="0.01"
                                class="w-24 bg-slate-950 border border-slate-700 rounded px-2 py-1 text-right text-white outline-none focus:border-blue-500"
                                prop:value=move || {
                                    let typed = freq_input.get();
                                    if typed.is_empty() {
                                        ctx.ts_session.with(|s| {
                                            s.as_ref().map(|s| s.frequency.to_string()).unwrap_or_default()
                                        })
                                    } else {
                                        typed
                                    }
                                }
                                on:input=move |ev| freq_input.set(event_target_value(&ev))
                                on:change=move |ev| apply_frequency(event_target_value(&ev))
                            />
                            <span class="text-slate-400">"Hz"</span>
                        </div>
                        <StatChip
                            label="Duration"
                            value=format!("{:.2} s", session.duration_secs())
                        />
                        <StatChip
                            label="Signal Columns"
                            value=session.signal_columns.len().to_string()
                        />
                        <StatChip
                            label="Displayed Rows"
                            value=ctx.data.with(|d| d.rows.len().to_string())
                        />
                    </div>
                    {move || freq_error.get().map(|err| view! {
                        <p class="text-sm text-red-400">{err}</p>
                    })}

                    <SignalTable />

                    <div class="text-xs text-slate-500 px-1">
                        {
                            let resident = ctx.data.with(|d| d.rows.len());
                            if resident < session.sample_count {
                                format!(
                                    "Showing {resident} of {} samples — preview only",
                                    session.sample_count
                                )
                            } else {
                                format!("All {} samples loaded", session.sample_count)
                            }
                        }
                    </div>
                }.into_any(),
            }}
        </div>
    }
}

/// Build and persist a session from the cached dataset.
fn initialize_session(ctx: AppCtx, file_id: Option<String>) {
    let session = ctx.data.with_untracked(|d| {
        let file_id = file_id.or_else(|| {
            d.upload
                .as_ref()
                .and_then(|u| u.primary_file_id().map(String::from))
        });
        TimeSeriesSession::initialize(
            &d.rows,
            d.columns.clone(),
            d.display_total_rows(),
            None,
            None,
            file_id,
            d.selected_model_action.clone(),
        )
    });
    log::info!(
        "time series session: {} samples at {} Hz, {} signal column(s)",
        session.sample_count,
        session.frequency,
        session.signal_columns.len()
    );
    storage::store().save_json(keys::TIME_SERIES_DATA, &session);
    ctx.ts_session.set(Some(session));
}

#[component]
fn StatChip(label: &'static str, value: String) -> impl IntoView {
    view! {
        <div class="px-4 py-2.5 bg-slate-900 border border-slate-800 rounded-xl text-sm">
            <span class="text-slate-400 font-medium">{label} ": "</span>
            <span class="text-white font-semibold">{value}</span>
        </div>
    }
}

/// Full scrollable table of resident samples, numerically formatted.
#[component]
fn SignalTable() -> impl IntoView {
    let ctx = AppCtx::expect();

    view! {
        <div class="overflow-auto bg-slate-900 border border-slate-800 rounded-xl" style="max-height: 60vh;">
            <table class="w-full text-left border-collapse min-w-max text-sm">
                <thead class="sticky top-0 bg-slate-950 z-10">
                    <tr>
                        {move || ctx.data.with(|d| d.columns.iter().enumerate().map(|(idx, col)| {
                            let align = if idx == 0 { "text-left" } else { "text-right" };
                            view! {
                                <th class=format!("p-3 text-[10px] font-bold text-slate-400 uppercase tracking-wider border-b border-slate-800 whitespace-nowrap {align}")>
                                    {col.clone()}
                                </th>
                            }
                        }).collect_view())}
                    </tr>
                </thead>
                <tbody class="divide-y divide-slate-800/50">
                    {move || ctx.data.with(|d| d.rows.iter().map(|row| {
                        let cells: Vec<(usize, String)> = d.columns.iter().enumerate().map(|(idx, col)| {
                            (idx, sample_text(row.get(col.as_str())))
                        }).collect();
                        view! {
                            <tr class="hover:bg-slate-800/30">
                                {cells.into_iter().map(|(idx, text)| {
                                    let align = if idx == 0 { "text-left" } else { "text-right" };
                                    view! {
                                        <td class=format!("p-2.5 text-slate-300 font-mono {align}")>{text}</td>
                                    }
                                }).collect_view()}
                            </tr>
                        }
                    }).collect_view())}
                </tbody>
            </table>
        </div>
    }
}

fn sample_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "—".to_string(),
        Some(Value::String(s)) if s.is_empty() => "—".to_string(),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else {
                format!("{:.6}", n.as_f64().unwrap_or_default())
            }
        }
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
