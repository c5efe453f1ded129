//! Training step: pick a label column and a set of models, post the
//! prepared dataset to the backend, and render per-model metrics.

use std::collections::HashSet;

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api::{self, TrainRequest, TrainResponse};
use crate::state::AppCtx;

const CLASSIFICATION_MODELS: [(&str, &str); 5] = [
    ("logreg", "Logistic Regression"),
    ("rf", "Random Forest"),
    ("gbm", "Gradient Boosting"),
    ("svm", "Support Vector Machine"),
    ("knn", "k-Nearest Neighbors"),
];

const REGRESSION_MODELS: [(&str, &str); 4] = [
    ("linreg", "Linear Regression"),
    ("ridge", "Ridge Regression"),
    ("lasso", "Lasso Regression"),
    ("rf_reg", "Random Forest Regressor"),
];

#[component]
pub fn TrainingPage() -> impl IntoView {
    let ctx = AppCtx::expect();
    let has_data = Signal::derive(move || ctx.data.with(|d| !d.rows.is_empty()));
    let task = ctx
        .data
        .with_untracked(|d| d.selected_model_action.clone())
        .unwrap_or_else(|| "classification".to_string());

    let label = RwSignal::new(String::new());
    let selected_models = RwSignal::new(HashSet::<String>::new());
    let training = RwSignal::new(false);
    let outcome = RwSignal::new(None::<Result<TrainResponse, String>>);

    let model_options: Vec<(&'static str, &'static str)> = if task == "regression" {
        REGRESSION_MODELS.to_vec()
    } else {
        CLASSIFICATION_MODELS.to_vec()
    };

    let columns = Signal::derive(move || ctx.data.with(|d| d.columns.clone()));

    let can_train = Signal::derive(move || {
        !label.with(|l| l.is_empty()) && selected_models.with(|m| !m.is_empty()) && !training.get()
    });

    let run_training = {
        let task = task.clone();
        move |_| {
            let label_col = label.get_untracked();
            let models: Vec<String> = selected_models.get_untracked().into_iter().collect();
            if label_col.is_empty() || models.is_empty() {
                return;
            }

            let request = ctx.data.with_untracked(|d| TrainRequest {
                data: d.rows.clone(),
                features: d
                    .columns
                    .iter()
                    .filter(|c| **c != label_col)
                    .cloned()
                    .collect(),
                label: label_col,
                model_ids: models,
                task: task.clone(),
                train_split_percentage: 80,
                test_split_percentage: 20,
                null_handling_method: "impute".to_string(),
            });

            training.set(true);
            outcome.set(None);
            spawn_local(async move {
                let result = api::train_models(&request).await;
                training.set(false);
                if let Err(err) = &result {
                    log::error!("training failed: {err}");
                }
                outcome.set(Some(result));
            });
        }
    };

    view! {
        <div class="space-y-6">
            <div>
                <h1 class="text-3xl font-bold text-white">"Model Training"</h1>
                <p class="text-sm text-slate-500 mt-1">
                    {format!("Task: {task} · all non-label columns are used as features")}
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
                let model_options = model_options.clone();
                let run_training = run_training.clone();
                view! {
                    <div class="bg-slate-900 border border-slate-800 rounded-xl p-6 space-y-5">
                        <div class="space-y-2">
                            <label class="block text-xs font-semibold text-slate-500 uppercase">"Label Column"</label>
                            <select
                                class="w-72 bg-slate-950 border border-slate-700 rounded-lg px-3 py-2 text-sm text-white outline-none focus:border-blue-500"
                                on:change=move |ev| label.set(event_target_value(&ev))
                            >
                                <option value="" selected disabled>"Select the column to predict..."</option>
                                {move || columns.get().into_iter().map(|col| view! {
                                    <option value=col.clone()>{col.clone()}</option>
                                }).collect_view()}
                            </select>
                        </div>

                        <div class="space-y-2">
                            <label class="block text-xs font-semibold text-slate-500 uppercase">"Models"</label>
                            <div class="flex flex-wrap gap-2">
                                {model_options.into_iter().map(|(id, name)| {
                                    let is_on = Signal::derive(move || {
                                        selected_models.with(|m| m.contains(id))
                                    });
                                    view! {
                                        <button
                                            class=move || format!(
                                                "px-3 py-1.5 rounded-full text-xs font-medium border transition-all {}",
                                                if is_on.get() {
                                                    "bg-blue-600/20 border-blue-500/50 text-blue-300"
                                                } else {
                                                    "bg-slate-950 border-slate-700 text-slate-500 hover:border-slate-500"
                                                }
                                            )
                                            on:click=move |_| {
                                                selected_models.update(|m| {
                                                    if !m.remove(id) {
                                                        m.insert(id.to_string());
                                                    }
                                                });
                                            }
                                        >
                                            {name}
                                        </button>
                                    }
                                }).collect_view()}
                            </div>
                        </div>

                        <button
                            class="px-6 py-2.5 bg-gradient-to-r from-blue-600 to-blue-500 hover:from-blue-500 hover:to-blue-400 disabled:from-slate-800 disabled:to-slate-800 disabled:text-slate-600 disabled:cursor-not-allowed text-white text-sm font-semibold rounded-lg transition-all"
                            disabled=move || !can_train.get()
                            on:click=run_training
                        >
                            {move || if training.get() { "Training..." } else { "Train Models" }}
                        </button>
                    </div>

                    {move || training.get().then(|| view! {
                        <div class="flex items-center space-x-3 text-slate-400 text-sm">
                            <div class="w-5 h-5 border-2 border-slate-700 border-t-blue-500 rounded-full animate-spin"></div>
                            <span>"Training models on the server; this can take a while..."</span>
                        </div>
                    })}

                    {move || outcome.get().map(|result| match result {
                        Ok(response) => view! { <ResultsTable response /> }.into_any(),
                        Err(err) => view! {
                            <div class="p-4 bg-red-900/20 border border-red-800/50 rounded-xl text-sm text-red-200">
                                {err}
                            </div>
                        }.into_any(),
                    })}
                }.into_any()
            }}
        </div>
    }
}

#[component]
fn ResultsTable(response: TrainResponse) -> impl IntoView {
    if response.results.is_empty() {
        return view! {
            <div class="p-4 bg-slate-900 border border-slate-800 rounded-xl text-sm text-slate-400">
                "The server returned no model results."
            </div>
        }
        .into_any();
    }

    view! {
        <div class="space-y-4">
            {response.results.into_iter().map(|result| {
                let header = format!(
                    "{}{}",
                    result.model_id,
                    match (result.train_size, result.test_size) {
                        (Some(train), Some(test)) => format!(" · {train} train / {test} test"),
                        _ => String::new(),
                    }
                );
                match result.error {
                    Some(err) => view! {
                        <div class="p-4 bg-slate-900 border border-red-800/40 rounded-xl">
                            <p class="font-mono text-sm text-white">{header}</p>
                            <p class="text-xs text-red-300 mt-2">{err}</p>
                        </div>
                    }.into_any(),
                    None => view! {
                        <div class="p-4 bg-slate-900 border border-slate-800 rounded-xl">
                            <p class="font-mono text-sm text-white mb-3">{header}</p>
                            <div class="grid grid-cols-2 md:grid-cols-4 gap-3">
                                {result.metrics.into_iter().map(|(metric, value)| {
                                    let display = value
                                        .as_f64()
                                        .map(|v| format!("{v:.4}"))
                                        .unwrap_or_else(|| value.to_string());
                                    view! {
                                        <div class="bg-slate-950 border border-slate-800 rounded-lg p-3">
                                            <p class="text-[10px] text-slate-500 uppercase tracking-wider">{metric}</p>
                                            <p class="text-lg font-bold text-white font-mono">{display}</p>
                                        </div>
                                    }
                                }).collect_view()}
                            </div>
                        </div>
                    }.into_any(),
                }
            }).collect_view()}
        </div>
    }
    .into_any()
}
