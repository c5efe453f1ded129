use leptos::prelude::*;
use lucide_leptos::{
    Brain, ChartColumn, Eraser, Package, Settings as SettingsIcon, Table, TriangleAlert,
    Upload as UploadIcon,
};

use preplab_core::Step;

mod api;
mod charts;
mod cleaning;
mod engineering;
mod images;
mod state;
mod storage;
mod timeseries;
mod training;
mod upload;
mod viewer;
mod visualization;

use cleaning::CleaningPage;
use engineering::EngineeringPage;
use state::AppCtx;
use training::TrainingPage;
use upload::UploadPage;
use viewer::ViewerPage;
use visualization::VisualizationPage;

#[component]
fn App() -> impl IntoView {
    let ctx = AppCtx::init();

    view! {
        <div class="flex h-screen bg-slate-950 text-slate-100 font-sans">
            // Sidebar: workflow navigation
            <nav class="w-64 border-r border-slate-800 flex flex-col p-4 bg-slate-900/50">
                <div class="flex items-center space-x-3 px-2 py-6 mb-6">
                    <div class="p-2 bg-blue-600 rounded-lg shadow-lg shadow-blue-900/20">
                        <Package size=24 />
                    </div>
                    <span class="text-2xl font-bold tracking-tight text-white">"PrepLab"</span>
                </div>

                <div class="space-y-1">
                    {Step::ALL.into_iter().map(|step| view! { <NavButton step /> }).collect_view()}
                </div>

                <div class="mt-auto px-2 py-4 text-[10px] text-slate-600">
                    {move || ctx.data.with(|d| {
                        if d.has_dataset() {
                            format!(
                                "{} rows × {} columns loaded",
                                d.display_total_rows(),
                                d.display_total_cols()
                            )
                        } else {
                            "No dataset loaded".to_string()
                        }
                    })}
                </div>
            </nav>

            // Main content: exactly one step container at a time
            <main class="flex-grow overflow-auto p-8">
                {move || ctx.nav_warning.get().map(|warning| view! {
                    <div class="mb-6 p-4 bg-yellow-900/20 border border-yellow-700/50 rounded-xl flex items-start space-x-3">
                        <div class="text-yellow-500 mt-0.5"><TriangleAlert size=18 /></div>
                        <p class="text-sm text-yellow-200">{warning}</p>
                    </div>
                })}
                {move || match ctx.active_step.get() {
                    Step::Upload => view! { <UploadPage /> }.into_any(),
                    Step::Viewer => view! { <ViewerPage /> }.into_any(),
                    Step::Cleaning => view! { <CleaningPage /> }.into_any(),
                    Step::Engineering => view! { <EngineeringPage /> }.into_any(),
                    Step::Visualization => view! { <VisualizationPage /> }.into_any(),
                    Step::Training => view! { <TrainingPage /> }.into_any(),
                }}
            </main>

            // Background full-fetch notice
            {move || ctx.fetching_full.get().then(|| view! {
                <div class="fixed bottom-6 right-6 bg-slate-900/95 border border-slate-700 text-slate-200 px-5 py-3 rounded-xl shadow-2xl flex items-center space-x-3 text-sm z-50">
                    <div class="w-4 h-4 border-2 border-slate-600 border-t-sky-400 rounded-full animate-spin"></div>
                    <span>"Loading full dataset in the background..."</span>
                </div>
            })}
        </div>
    }
}

#[component]
fn NavButton(step: Step) -> impl IntoView {
    let ctx = AppCtx::expect();
    let available = Signal::derive(move || ctx.data.with(|d| step.is_available(d)));
    // A descriptor or resident rows is enough to show the locked steps
    // as disabled; with neither they are hidden entirely.
    let any_dataset = Signal::derive(move || {
        ctx.data.with(|d| d.upload.is_some() || !d.rows.is_empty())
    });
    let is_active = move || ctx.active_step.get() == step;

    let icon = match step {
        Step::Upload => view! { <UploadIcon size=20 /> }.into_any(),
        Step::Viewer => view! { <Table size=20 /> }.into_any(),
        Step::Cleaning => view! { <Eraser size=20 /> }.into_any(),
        Step::Engineering => view! { <SettingsIcon size=20 /> }.into_any(),
        Step::Visualization => view! { <ChartColumn size=20 /> }.into_any(),
        Step::Training => view! { <Brain size=20 /> }.into_any(),
    };

    view! {
        <button
            class=move || format!(
                "w-full flex items-center space-x-3 px-4 py-3 rounded-xl transition-all duration-200 group {}",
                if is_active() {
                    "bg-slate-800 text-white shadow-sm"
                } else if available.get() {
                    "hover:bg-slate-800 text-slate-400 hover:text-white"
                } else {
                    "text-slate-600 cursor-not-allowed"
                }
            )
            style:display=move || {
                if step != Step::Upload && !available.get() && !any_dataset.get() {
                    "none"
                } else {
                    ""
                }
            }
            disabled=move || !available.get()
            title=move || {
                if available.get() {
                    ""
                } else {
                    "Upload a dataset first to access this section"
                }
            }
            on:click=move |_| ctx.navigate(step)
        >
            <div class=move || {
                if is_active() { "text-blue-400" } else { "group-hover:text-blue-400 transition-colors" }
            }>
                {icon}
            </div>
            <span class="font-medium text-sm">{step.label()}</span>
        </button>
    }
}

fn main() {
    let debug_enabled = web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .and_then(|s| s.get_item("debug_enabled").ok().flatten())
        .is_some_and(|v| v == "true");

    let level = if debug_enabled {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    _ = console_log::init_with_level(level);
    console_error_panic_hook::set_once();
    mount_to_body(App);
}
