//! Feature engineering step: create rule-based and combined features.
//! Definitions go into the derived-feature record so they replay after
//! every dataset reload.

use leptos::prelude::*;

use preplab_core::{CompareOp, CreatedFeature};

use crate::state::AppCtx;

#[component]
pub fn EngineeringPage() -> impl IntoView {
    let ctx = AppCtx::expect();
    let has_data = Signal::derive(move || ctx.data.with(|d| !d.rows.is_empty()));
    let notice = RwSignal::new(None::<Result<String, String>>);

    let add_feature = move |feature: CreatedFeature| {
        let name = feature.feature_name().to_string();
        if name.trim().is_empty() {
            notice.set(Some(Err("Feature name must not be empty".to_string())));
            return;
        }
        let exists = ctx
            .data
            .with_untracked(|d| d.columns.iter().any(|c| *c == name));
        if exists {
            notice.set(Some(Err(format!("A column named \"{name}\" already exists"))));
            return;
        }
        ctx.data.update(|d| d.add_feature(feature));
        ctx.persist();
        notice.set(Some(Ok(format!("Created feature \"{name}\""))));
    };

    view! {
        <div class="space-y-6">
            <div>
                <h1 class="text-3xl font-bold text-white">"Feature Engineering"</h1>
                <p class="text-sm text-slate-500 mt-1">
                    "Derived columns are recomputed automatically whenever the dataset reloads"
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
                    {move || notice.get().map(|result| match result {
                        Ok(msg) => view! {
                            <div class="p-3 bg-emerald-900/20 border border-emerald-700/40 rounded-lg text-sm text-emerald-300">{msg}</div>
                        }.into_any(),
                        Err(msg) => view! {
                            <div class="p-3 bg-red-900/20 border border-red-700/40 rounded-lg text-sm text-red-300">{msg}</div>
                        }.into_any(),
                    })}

                    <div class="grid grid-cols-1 lg:grid-cols-2 gap-6">
                        <RuleBasedForm on_create=Callback::new(add_feature) />
                        <CombinedForm on_create=Callback::new(add_feature) />
                    </div>

                    <FeatureList />
                }.into_any()
            }}
        </div>
    }
}

#[component]
fn RuleBasedForm(on_create: Callback<CreatedFeature>) -> impl IntoView {
    let ctx = AppCtx::expect();
    let variable = RwSignal::new(String::new());
    let operator = RwSignal::new(">".to_string());
    let value = RwSignal::new(String::new());
    let name = RwSignal::new(String::new());
    let error = RwSignal::new(None::<String>);

    let columns = Signal::derive(move || ctx.data.with(|d| d.columns.clone()));

    let create = move |_| {
        let Some(op) = CompareOp::parse(&operator.get_untracked()) else {
            return;
        };
        let Ok(threshold) = value.get_untracked().trim().parse::<f64>() else {
            error.set(Some("Comparison value must be numeric".to_string()));
            return;
        };
        if variable.get_untracked().is_empty() {
            error.set(Some("Choose a source variable".to_string()));
            return;
        }
        error.set(None);
        on_create.run(CreatedFeature::RuleBased {
            variable: variable.get_untracked(),
            operator: op,
            value: threshold,
            feature_name: name.get_untracked().trim().to_string(),
        });
        value.set(String::new());
        name.set(String::new());
    };

    view! {
        <div class="bg-slate-900 border border-slate-800 rounded-xl p-6 space-y-4">
            <div>
                <h2 class="font-semibold text-white">"Rule-Based Feature"</h2>
                <p class="text-xs text-slate-500 mt-1">"Flag rows as 1/0 from a numeric comparison"</p>
            </div>
            <div class="grid grid-cols-3 gap-3">
                <select
                    class="col-span-1 bg-slate-950 border border-slate-700 rounded-lg px-3 py-2 text-sm text-white outline-none focus:border-blue-500"
                    on:change=move |ev| variable.set(event_target_value(&ev))
                >
                    <option value="" selected disabled>"Variable..."</option>
                    {move || columns.get().into_iter().map(|col| view! {
                        <option value=col.clone()>{col.clone()}</option>
                    }).collect_view()}
                </select>
                <select
                    class="col-span-1 bg-slate-950 border border-slate-700 rounded-lg px-3 py-2 text-sm text-white outline-none focus:border-blue-500"
                    on:change=move |ev| operator.set(event_target_value(&ev))
                >
                    {CompareOp::ALL.into_iter().map(|op| view! {
                        <option value=op.symbol() selected=op.symbol() == ">">{op.symbol()}</option>
                    }).collect_view()}
                </select>
                <input
                    type="number"
                    step="any"
                    placeholder="Value"
                    class="col-span-1 bg-slate-950 border border-slate-700 rounded-lg px-3 py-2 text-sm text-white outline-none focus:border-blue-500"
                    prop:value=value
                    on:input=move |ev| value.set(event_target_value(&ev))
                />
            </div>
            <input
                type="text"
                placeholder="New feature name"
                class="w-full bg-slate-950 border border-slate-700 rounded-lg px-3 py-2 text-sm text-white outline-none focus:border-blue-500"
                prop:value=name
                on:input=move |ev| name.set(event_target_value(&ev))
            />
            {move || error.get().map(|err| view! { <p class="text-xs text-red-400">{err}</p> })}
            <button
                class="px-5 py-2 bg-blue-600 hover:bg-blue-500 text-white text-sm font-medium rounded-lg transition-colors"
                on:click=create
            >
                "Create Feature"
            </button>
        </div>
    }
}

#[component]
fn CombinedForm(on_create: Callback<CreatedFeature>) -> impl IntoView {
    let ctx = AppCtx::expect();
    let column_a = RwSignal::new(String::new());
    let column_b = RwSignal::new(String::new());
    let name = RwSignal::new(String::new());
    let error = RwSignal::new(None::<String>);

    let columns = Signal::derive(move || ctx.data.with(|d| d.columns.clone()));

    let create = move |_| {
        let a = column_a.get_untracked();
        let b = column_b.get_untracked();
        if a.is_empty() || b.is_empty() {
            error.set(Some("Choose both source columns".to_string()));
            return;
        }
        if a == b {
            error.set(Some("Pick two different columns".to_string()));
            return;
        }
        error.set(None);
        on_create.run(CreatedFeature::Combined {
            column_a: a,
            column_b: b,
            feature_name: name.get_untracked().trim().to_string(),
        });
        name.set(String::new());
    };

    view! {
        <div class="bg-slate-900 border border-slate-800 rounded-xl p-6 space-y-4">
            <div>
                <h2 class="font-semibold text-white">"Combined Feature"</h2>
                <p class="text-xs text-slate-500 mt-1">
                    "Coalesce two columns: the first non-missing value of the pair"
                </p>
            </div>
            <div class="grid grid-cols-2 gap-3">
                {[("Column A...", column_a), ("Column B...", column_b)].into_iter().map(|(placeholder, signal)| view! {
                    <select
                        class="bg-slate-950 border border-slate-700 rounded-lg px-3 py-2 text-sm text-white outline-none focus:border-blue-500"
                        on:change=move |ev| signal.set(event_target_value(&ev))
                    >
                        <option value="" selected disabled>{placeholder}</option>
                        {move || columns.get().into_iter().map(|col| view! {
                            <option value=col.clone()>{col.clone()}</option>
                        }).collect_view()}
                    </select>
                }).collect_view()}
            </div>
            <input
                type="text"
                placeholder="New feature name"
                class="w-full bg-slate-950 border border-slate-700 rounded-lg px-3 py-2 text-sm text-white outline-none focus:border-blue-500"
                prop:value=name
                on:input=move |ev| name.set(event_target_value(&ev))
            />
            {move || error.get().map(|err| view! { <p class="text-xs text-red-400">{err}</p> })}
            <button
                class="px-5 py-2 bg-blue-600 hover:bg-blue-500 text-white text-sm font-medium rounded-lg transition-colors"
                on:click=create
            >
                "Create Feature"
            </button>
        </div>
    }
}

#[component]
fn FeatureList() -> impl IntoView {
    let ctx = AppCtx::expect();

    view! {
        <div class="bg-slate-900 border border-slate-800 rounded-xl p-6">
            <h2 class="font-semibold text-white mb-4">"Created Features"</h2>
            {move || {
                let features = ctx.data.with(|d| d.created_features.clone());
                if features.is_empty() {
                    view! { <p class="text-sm text-slate-500">"No derived features yet"</p> }.into_any()
                } else {
                    view! {
                        <div class="divide-y divide-slate-800">
                            {features.into_iter().map(|feature| {
                                let description = match &feature {
                                    CreatedFeature::RuleBased { variable, operator, value, .. } => {
                                        format!("1 when {variable} {} {value}, else 0", operator.symbol())
                                    }
                                    CreatedFeature::Combined { column_a, column_b, .. } => {
                                        format!("first non-missing of {column_a} and {column_b}")
                                    }
                                };
                                view! {
                                    <div class="py-3 flex items-center justify-between">
                                        <span class="font-mono text-sm text-blue-300">{feature.feature_name().to_string()}</span>
                                        <span class="text-xs text-slate-500">{description}</span>
                                    </div>
                                }
                            }).collect_view()}
                        </div>
                    }.into_any()
                }
            }}
        </div>
    }
}
