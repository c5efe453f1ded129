//! Upload step: file selection, model type/action selection, and the
//! upload-and-process flow that populates the data cache.

use leptos::prelude::*;
use leptos::task::spawn_local;
use lucide_leptos::{CircleCheck, FileUp, TriangleAlert};

use preplab_core::store::keys;
use preplab_core::{Step, TimeSeriesSession, UploadResponse};

use crate::api;
use crate::state::AppCtx;
use crate::storage;

#[derive(Clone, Copy, PartialEq, Eq)]
struct ModelTypeOption {
    id: &'static str,
    label: &'static str,
    blurb: &'static str,
}

const MODEL_TYPES: [ModelTypeOption; 2] = [
    ModelTypeOption {
        id: "ehr",
        label: "EHR / Tabular",
        blurb: "Upload Data → View Dataset → Clean → Engineer Features → Train",
    },
    ModelTypeOption {
        id: "time_series",
        label: "Time Series",
        blurb: "Upload Signals → View Data → Adjust Frequency → Train",
    },
];

const MODEL_ACTIONS: [(&str, &str); 2] = [
    ("classification", "Classification"),
    ("regression", "Regression"),
];

/// Outcome panel data for a finished upload.
#[derive(Clone, PartialEq)]
struct UploadOutcome {
    message: String,
    detected_type: String,
    selected_type: String,
    selected_action: String,
    type_matches: bool,
    backend_warning: Option<String>,
    uploaded_at: String,
}

#[component]
pub fn UploadPage() -> impl IntoView {
    let ctx = AppCtx::expect();

    let selected_file = RwSignal::new_local(None::<web_sys::File>);
    let model_type = RwSignal::new(
        ctx.data
            .with_untracked(|d| d.selected_model_type.clone()),
    );
    let model_action = RwSignal::new(None::<String>);
    let uploading = RwSignal::new(false);
    let outcome = RwSignal::new(None::<Result<UploadOutcome, String>>);

    // Plain closure rather than a derived signal: the file handle lives
    // in thread-local storage.
    let can_upload = move || {
        selected_file.with(|f| f.is_some())
            && model_type.with(|t| t.is_some())
            && model_action.with(|a| a.is_some())
            && !uploading.get()
    };

    let on_file_change = move |ev: web_sys::Event| {
        let input: web_sys::HtmlInputElement = event_target(&ev);
        let file = input.files().and_then(|files| files.get(0));
        if let Some(file) = &file {
            log::info!("file selected: {} ({} bytes)", file.name(), file.size());
        }
        selected_file.set(file);
    };

    let do_upload = move |_| {
        let Some(file) = selected_file.get_untracked() else {
            return;
        };
        let (Some(mtype), Some(action)) =
            (model_type.get_untracked(), model_action.get_untracked())
        else {
            return;
        };

        // Replacing a live session needs an explicit go-ahead.
        let has_existing = ctx
            .data
            .with_untracked(|d| d.upload.is_some() || !d.rows.is_empty());
        if has_existing {
            let proceed = web_sys::window()
                .map(|w| {
                    w.confirm_with_message(
                        "Uploading a new dataset will clear the current dataset and all \
                         unsaved changes.\n\nDo you want to continue?",
                    )
                    .unwrap_or(true)
                })
                .unwrap_or(true);
            if !proceed {
                return;
            }
            ctx.start_new_upload();
            ctx.data
                .update(|d| d.selected_model_type = Some(mtype.clone()));
        }

        uploading.set(true);
        outcome.set(None);

        spawn_local(async move {
            let result = api::upload_files(file, mtype.clone(), action.clone()).await;
            uploading.set(false);

            match result {
                Ok(mut resp) => {
                    // The user's selection is authoritative for routing;
                    // detection only feeds the soft warning below.
                    resp.selected_model_type = mtype.clone();
                    resp.selected_model_action = action.clone();
                    finish_upload(ctx, resp, outcome).await;
                }
                Err(err) => {
                    log::error!("upload error: {err}");
                    outcome.set(Some(Err(err)));
                }
            }
        });
    };

    view! {
        <div class="space-y-6 max-w-3xl">
            <h1 class="text-3xl font-bold text-white">"Upload Dataset"</h1>

            // File picker
            <div class="bg-slate-900 border border-slate-800 rounded-xl p-6 space-y-4">
                <label class="block">
                    <div
                        class="border-2 border-dashed border-slate-700 hover:border-blue-500 rounded-xl p-10 text-center cursor-pointer transition-colors"
                        on:dragover=move |ev| ev.prevent_default()
                        on:drop=move |ev: web_sys::DragEvent| {
                            ev.prevent_default();
                            let dropped = ev
                                .data_transfer()
                                .and_then(|dt| dt.files())
                                .and_then(|files| files.get(0));
                            if let Some(file) = dropped {
                                log::info!("file dropped: {}", file.name());
                                selected_file.set(Some(file));
                            }
                        }
                    >
                        <div class="mx-auto w-12 h-12 text-blue-500 flex items-center justify-center mb-3">
                            <FileUp size=40 />
                        </div>
                        <p class="text-slate-300 font-medium">
                            {move || selected_file.with(|f| match f {
                                Some(file) => file.name(),
                                None => "Drop a file here or click to browse".to_string(),
                            })}
                        </p>
                        <p class="text-xs text-slate-500 mt-1">"Single file only (CSV, JSON, or ZIP archive)"</p>
                        <input type="file" class="hidden" on:change=on_file_change />
                    </div>
                </label>
                {move || selected_file.with(|f| f.as_ref().map(|file| {
                    let size_kb = file.size() / 1024.0;
                    view! {
                        <div class="flex items-center justify-between text-sm text-slate-400 px-1">
                            <span>{format!("{} · {:.1} KB", file.name(), size_kb)}</span>
                            <button
                                class="text-red-400 hover:text-red-300 transition-colors"
                                on:click=move |_| selected_file.set(None)
                            >
                                "Remove"
                            </button>
                        </div>
                    }
                }))}
            </div>

            // Model type selection
            <div class="bg-slate-900 border border-slate-800 rounded-xl p-6 space-y-3">
                <h2 class="text-sm font-semibold text-slate-400 uppercase tracking-wider">"Model Type"</h2>
                <div class="grid grid-cols-1 md:grid-cols-2 gap-3">
                    {MODEL_TYPES.into_iter().map(|option| {
                        let is_selected = Signal::derive(move || {
                            model_type.with(|t| t.as_deref() == Some(option.id))
                        });
                        view! {
                            <button
                                class=move || format!(
                                    "text-left p-4 rounded-xl border transition-all {}",
                                    if is_selected.get() {
                                        "border-blue-500 bg-blue-600/10"
                                    } else {
                                        "border-slate-700 hover:border-slate-500"
                                    }
                                )
                                on:click=move |_| {
                                    model_type.set(Some(option.id.to_string()));
                                    storage::store().save_string(keys::SELECTED_MODEL_TYPE, option.id);
                                    ctx.data.update(|d| d.selected_model_type = Some(option.id.to_string()));
                                }
                            >
                                <p class="font-semibold text-white">{option.label}</p>
                                <p class="text-xs text-slate-500 mt-1">{option.blurb}</p>
                            </button>
                        }
                    }).collect_view()}
                </div>
            </div>

            // Task selection
            <div class="bg-slate-900 border border-slate-800 rounded-xl p-6 space-y-3">
                <h2 class="text-sm font-semibold text-slate-400 uppercase tracking-wider">"Task"</h2>
                <div class="flex gap-3">
                    {MODEL_ACTIONS.into_iter().map(|(id, label)| {
                        let is_selected = Signal::derive(move || {
                            model_action.with(|a| a.as_deref() == Some(id))
                        });
                        view! {
                            <button
                                class=move || format!(
                                    "px-5 py-2.5 rounded-lg border text-sm font-medium transition-all {}",
                                    if is_selected.get() {
                                        "border-blue-500 bg-blue-600/10 text-white"
                                    } else {
                                        "border-slate-700 text-slate-400 hover:border-slate-500"
                                    }
                                )
                                on:click=move |_| model_action.set(Some(id.to_string()))
                            >
                                {label}
                            </button>
                        }
                    }).collect_view()}
                </div>
            </div>

            <button
                class="w-full py-3 bg-gradient-to-r from-emerald-600 to-emerald-500 hover:from-emerald-500 hover:to-emerald-400 disabled:from-slate-800 disabled:to-slate-800 disabled:text-slate-600 disabled:cursor-not-allowed text-white font-semibold rounded-xl transition-all"
                disabled=move || !can_upload()
                on:click=do_upload
            >
                {move || if uploading.get() { "Processing..." } else { "Upload & Process File" }}
            </button>

            {move || uploading.get().then(|| view! {
                <div class="flex items-center justify-center space-x-3 text-slate-400 text-sm py-2">
                    <div class="w-5 h-5 border-2 border-slate-700 border-t-blue-500 rounded-full animate-spin"></div>
                    <span>"Uploading and analyzing the file..."</span>
                </div>
            })}

            {move || outcome.get().map(|result| match result {
                Ok(summary) => view! { <UploadSuccess summary /> }.into_any(),
                Err(err) => view! { <UploadError err /> }.into_any(),
            })}
        </div>
    }
}

/// Install a successful upload into the cache, load the dataset, and move
/// to the viewer.
async fn finish_upload(
    ctx: AppCtx,
    resp: UploadResponse,
    outcome: RwSignal<Option<Result<UploadOutcome, String>>>,
) {
    let store = storage::store();
    store.save_json(keys::UPLOADED_DATA, &resp);
    store.save_string(keys::SELECTED_MODEL_TYPE, resp.model_type());
    store.remove(keys::DATA_MODIFIED);
    store.remove(keys::TIME_SERIES_DATA);

    let summary = UploadOutcome {
        message: resp.message.clone(),
        detected_type: resp.detected_type.clone(),
        selected_type: resp.selected_model_type.clone(),
        selected_action: resp.selected_model_action.clone(),
        type_matches: resp.type_matches_detected(),
        backend_warning: resp.warning.clone(),
        uploaded_at: chrono::Local::now().format("%H:%M, %d %b %Y").to_string(),
    };

    let model_type = resp.model_type().to_string();
    let file_id = resp.primary_file_id().map(String::from);

    ctx.data.update(|d| {
        d.selected_model_type = Some(model_type.clone());
        d.selected_model_action = Some(resp.selected_model_action.clone());
        d.data_modified = false;
        d.upload = Some(resp);
    });
    outcome.set(Some(Ok(summary)));

    match (model_type.as_str(), file_id) {
        ("imaging", Some(file_id)) => {
            // The browser fetches the tree itself; remember the session.
            let meta = preplab_core::models::ImageMetadata {
                upload_id: Some(file_id.clone()),
                task_type: ctx.data.with_untracked(|d| d.selected_model_action.clone()),
                label_type: None,
                model_type: Some("imaging".to_string()),
            };
            store.save_json(keys::IMAGE_METADATA, &meta);
            ctx.image_session.update(|s| {
                *s = preplab_core::browse::ImageSession {
                    upload_id: Some(file_id),
                    ..Default::default()
                }
            });
            ctx.activate(Step::Viewer);
        }
        (_, Some(file_id)) => {
            // Tabular and time-series data both load the complete
            // dataset; the cache coalesces duplicate requests.
            if ctx.load_full_dataset(file_id.clone()).await {
                if model_type == "time_series" {
                    let session = ctx.data.with_untracked(|d| {
                        TimeSeriesSession::initialize(
                            &d.rows,
                            d.columns.clone(),
                            d.display_total_rows(),
                            None,
                            None,
                            Some(file_id),
                            d.selected_model_action.clone(),
                        )
                    });
                    storage::store().save_json(keys::TIME_SERIES_DATA, &session);
                    ctx.ts_session.set(Some(session));
                }
                ctx.activate(Step::Viewer);
            }
        }
        (_, None) => {
            log::error!("upload succeeded but returned no file ids");
            outcome.set(Some(Err(
                "The server accepted the upload but returned no file reference. \
                 Please try again."
                    .to_string(),
            )));
        }
    }
}

#[component]
fn UploadSuccess(summary: UploadOutcome) -> impl IntoView {
    let ctx = AppCtx::expect();
    let verification = if summary.type_matches {
        view! {
            <div class="flex items-start space-x-2 p-3 bg-emerald-900/20 border border-emerald-700/40 rounded-lg text-sm text-emerald-300">
                <CircleCheck size=16 />
                <span>
                    {format!(
                        "Verified: selected model type \"{}\" matches detected data type \"{}\"",
                        summary.selected_type, summary.detected_type
                    )}
                </span>
            </div>
        }
        .into_any()
    } else {
        view! {
            <div class="flex items-start space-x-2 p-3 bg-red-900/20 border border-red-700/40 rounded-lg text-sm text-red-300">
                <TriangleAlert size=16 />
                <span>
                    {format!(
                        "Warning: selected model type \"{}\" may not match detected data type \"{}\". \
                         Please verify your selection.",
                        summary.selected_type, summary.detected_type
                    )}
                </span>
            </div>
        }
        .into_any()
    };

    view! {
        <div class="bg-slate-900 border border-slate-800 rounded-xl p-6 space-y-3">
            <p class="font-semibold text-white">"Success!"</p>
            <p class="text-sm text-slate-300">{summary.message}</p>
            <p class="text-xs text-slate-500">
                {format!(
                    "Detected type: {} | Selected model: {} | Action: {} | Uploaded at {}",
                    summary.detected_type,
                    summary.selected_type,
                    summary.selected_action,
                    summary.uploaded_at
                )}
            </p>
            {verification}
            {summary.backend_warning.map(|warning| view! {
                <div class="p-3 bg-yellow-900/20 border border-yellow-700/40 rounded-lg text-sm text-yellow-200">
                    {warning}
                </div>
            })}
            <div class="pt-2 text-center">
                <button
                    class="px-6 py-2.5 bg-blue-600 hover:bg-blue-500 text-white rounded-lg font-medium transition-colors"
                    on:click=move |_| ctx.start_new_upload()
                >
                    "Upload New Dataset"
                </button>
            </div>
        </div>
    }
}

#[component]
fn UploadError(err: String) -> impl IntoView {
    view! {
        <div class="bg-red-900/20 border border-red-800/50 rounded-xl p-6 space-y-3">
            <p class="font-semibold text-red-300">"Upload Error"</p>
            <p class="text-sm text-red-200">{err}</p>
            <ul class="text-xs text-slate-400 list-disc pl-5 space-y-1">
                <li>"Check that the server is running"</li>
                <li>"Check that the file is not corrupted"</li>
                <li>"Very large files may time out; try a smaller file"</li>
            </ul>
        </div>
    }
}
