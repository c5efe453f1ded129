//! Finder-style browser for archive-based image datasets.

use leptos::prelude::*;
use leptos::task::spawn_local;
use lucide_leptos::{FileText, Folder, House, Image as ImageIcon};

use preplab_core::browse::{breadcrumb_parts, format_file_size, FolderNode, LabelMatches};
use preplab_core::models::ImageFile;
use preplab_core::store::keys;

use crate::api;
use crate::state::AppCtx;
use crate::storage;

/// A file opened from the grid, resolved for preview.
#[derive(Clone, PartialEq)]
struct OpenedFile {
    path: String,
    file_type: String,
    payload: ImageFile,
}

#[component]
pub fn ImageBrowser() -> impl IntoView {
    let ctx = AppCtx::expect();

    let file_id = ctx.data.with_untracked(|d| {
        d.upload
            .as_ref()
            .and_then(|u| u.primary_file_id().map(String::from))
            .or_else(|| ctx.image_session.with_untracked(|s| s.upload_id.clone()))
    });

    let Some(file_id) = file_id else {
        return view! {
            <div class="text-center py-20 text-slate-500">
                <p class="text-lg">"No file ID found in uploaded data"</p>
                <p class="text-sm mt-1">"Please upload a ZIP archive first"</p>
            </div>
        }
        .into_any();
    };

    let structure = RwSignal::new(None::<Result<FolderNode, String>>);
    let matches = RwSignal::new(LabelMatches::default());
    let current_path = RwSignal::new(String::new());
    let opened = RwSignal::new(None::<OpenedFile>);
    let open_error = RwSignal::new(None::<String>);

    {
        let file_id = file_id.clone();
        spawn_local(async move {
            let tree = api::fetch_image_structure(&file_id).await;
            if let Ok(tree) = &tree {
                if tree.is_empty() {
                    structure.set(Some(Err(
                        "The archive appears to be empty or its files were not extracted. \
                         Please check the uploaded ZIP."
                            .to_string(),
                    )));
                    return;
                }
                // Remember the session so a reload can pick it back up.
                ctx.image_session.update(|s| {
                    s.folder_structure = Some(tree.clone());
                    s.upload_id = Some(file_id.clone());
                    s.total_images = tree.total_files();
                });
                let store = storage::store();
                ctx.image_session
                    .with_untracked(|s| store.save_json(keys::IMAGE_DATA, s));

                if let Some(found) = api::fetch_image_matches(&file_id).await {
                    store.save_json(keys::IMAGE_LABELS, &found);
                    matches.set(found);
                }
            }
            structure.set(Some(tree));
        });
    }

    let open_file = {
        let file_id = file_id.clone();
        move |path: String, file_type: String| {
            let file_id = file_id.clone();
            spawn_local(async move {
                match api::fetch_image_file(&file_id, &path).await {
                    Ok(payload) => {
                        open_error.set(None);
                        opened.set(Some(OpenedFile {
                            path,
                            file_type,
                            payload,
                        }));
                    }
                    Err(err) => {
                        log::error!("error opening {path}: {err}");
                        open_error.set(Some(format!("Failed to load {path}: {err}")));
                    }
                }
            });
        }
    };

    view! {
        <div class="space-y-6">
            <h1 class="text-3xl font-bold text-white">"Image Dataset Browser"</h1>
            {move || match structure.get() {
                None => view! {
                    <div class="text-center py-20 text-slate-400">
                        <div class="w-10 h-10 mx-auto border-4 border-slate-700 border-t-blue-500 rounded-full animate-spin mb-4"></div>
                        <p>"Extracting archive contents..."</p>
                        <p class="text-xs text-slate-600 mt-1">"This may take a moment for large files"</p>
                    </div>
                }.into_any(),
                Some(Err(err)) => view! {
                    <div class="text-center py-16 bg-red-900/10 border border-red-800/40 rounded-xl space-y-3">
                        <p class="text-red-300 font-semibold">"Error Loading Image Dataset"</p>
                        <p class="text-sm text-slate-400 max-w-md mx-auto">{err}</p>
                    </div>
                }.into_any(),
                Some(Ok(tree)) => {
                    let open_file = open_file.clone();
                    view! {
                        <div class="flex bg-slate-900 border border-slate-800 rounded-xl overflow-hidden" style="height: calc(100vh - 220px);">
                            // Folder tree sidebar
                            <div class="w-64 border-r border-slate-800 overflow-auto p-3 bg-slate-900/60">
                                <div class="flex items-center space-x-2 px-2 pb-3 mb-2 border-b border-slate-800 text-slate-300">
                                    <Folder size=16 />
                                    <span class="text-sm font-semibold">"Folders"</span>
                                </div>
                                {folder_tree_view(&tree, 0, current_path)}
                            </div>

                            // Breadcrumb + file grid
                            <div class="flex-grow flex flex-col min-w-0">
                                <div class="flex items-center space-x-2 px-4 py-2.5 border-b border-slate-800 bg-slate-900/80 text-sm">
                                    <button
                                        class="flex items-center space-x-1 text-blue-400 hover:text-blue-300 transition-colors"
                                        on:click=move |_| current_path.set(String::new())
                                    >
                                        <House size=14 />
                                        <span>"Root"</span>
                                    </button>
                                    {move || breadcrumb_parts(&current_path.get()).into_iter().map(|(label, full)| view! {
                                        <span class="text-slate-600">"/"</span>
                                        <button
                                            class="text-blue-400 hover:underline"
                                            on:click=move |_| current_path.set(full.clone())
                                        >
                                            {label.clone()}
                                        </button>
                                    }).collect_view()}
                                </div>
                                <div class="flex-grow overflow-auto p-5">
                                    {
                                        let tree = tree.clone();
                                        move || file_grid_view(
                                            &tree,
                                            &current_path.get(),
                                            &matches.get(),
                                            current_path,
                                            open_file.clone(),
                                        )
                                    }
                                </div>
                            </div>

                            // Preview panel
                            <div class="w-96 border-l border-slate-800 overflow-auto bg-slate-950 p-4">
                                {move || open_error.get().map(|err| view! {
                                    <p class="text-sm text-red-300 mb-3">{err}</p>
                                })}
                                {move || match opened.get() {
                                    Some(file) => preview_view(file),
                                    None => view! {
                                        <p class="text-sm text-slate-600 text-center mt-20">
                                            "Click a file to preview it here"
                                        </p>
                                    }.into_any(),
                                }}
                            </div>
                        </div>
                    }.into_any()
                }
            }}
        </div>
    }
    .into_any()
}

fn folder_tree_view(node: &FolderNode, level: usize, current_path: RwSignal<String>) -> AnyView {
    node.children
        .iter()
        .map(|folder| {
            let path = folder.path.clone();
            let name = folder.name.clone();
            let indent = format!("padding-left: {}px", level * 16);
            let subtree = folder_tree_view(folder, level + 1, current_path);
            view! {
                <div>
                    <button
                        class="w-full flex items-center space-x-2 px-2 py-1.5 rounded-lg text-sm text-slate-300 hover:bg-slate-800 transition-colors"
                        style=indent
                        on:click=move |_| current_path.set(path.clone())
                    >
                        <Folder size=14 />
                        <span class="truncate">{name}</span>
                    </button>
                    {subtree}
                </div>
            }
        })
        .collect_view()
        .into_any()
}

fn file_grid_view(
    tree: &FolderNode,
    path: &str,
    matches: &LabelMatches,
    current_path: RwSignal<String>,
    open_file: impl Fn(String, String) + Clone + 'static,
) -> AnyView {
    let Some(folder) = tree.find(path) else {
        return view! { <p class="text-center text-slate-500 py-12">"Folder not found"</p> }
            .into_any();
    };
    if folder.is_empty() {
        return view! { <p class="text-center text-slate-500 py-12">"This folder is empty"</p> }
            .into_any();
    }

    let folders = folder
        .children
        .iter()
        .map(|sub| {
            let path = sub.path.clone();
            let name = sub.name.clone();
            view! {
                <button
                    class="p-4 bg-slate-900 border border-slate-800 hover:border-blue-500 rounded-xl text-center transition-all hover:-translate-y-0.5"
                    on:click=move |_| current_path.set(path.clone())
                >
                    <div class="text-blue-400 flex justify-center mb-2"><Folder size=36 /></div>
                    <p class="text-xs text-slate-300 break-words">{name}</p>
                </button>
            }
        })
        .collect_view();

    let files = folder
        .files
        .iter()
        .map(|file| {
            let labelled = matches.has_label(&file.path);
            let open = open_file.clone();
            let path = file.path.clone();
            let file_type = file.file_type.clone();
            let icon = if file.is_image() {
                view! { <ImageIcon size=36 /> }.into_any()
            } else {
                view! { <FileText size=36 /> }.into_any()
            };
            view! {
                <button
                    class=format!(
                        "relative p-4 bg-slate-900 border rounded-xl text-center transition-all hover:-translate-y-0.5 hover:border-blue-500 {}",
                        if labelled { "border-emerald-600/60" } else { "border-slate-800" }
                    )
                    on:click=move |_| open(path.clone(), file_type.clone())
                >
                    {labelled.then(|| view! {
                        <span class="absolute top-2 right-2 w-4 h-4 bg-emerald-500 rounded-full text-[9px] text-white flex items-center justify-center">"✓"</span>
                    })}
                    <div class="text-slate-400 flex justify-center mb-2">{icon}</div>
                    <p class="text-xs text-slate-300 break-words">{file.name.clone()}</p>
                    <p class="text-[10px] text-slate-600 mt-1">{format_file_size(file.size)}</p>
                </button>
            }
        })
        .collect_view();

    view! {
        <div class="grid gap-4" style="grid-template-columns: repeat(auto-fill, minmax(120px, 1fr));">
            {folders}
            {files}
        </div>
    }
    .into_any()
}

fn preview_view(file: OpenedFile) -> AnyView {
    let size = format_file_size(file.payload.size);
    if file.file_type == "image" {
        if let Some(base64) = file.payload.base64 {
            let ext = file.payload.extension.trim_start_matches('.');
            let src = format!("data:image/{ext};base64,{base64}");
            return view! {
                <div class="space-y-3">
                    <img src=src class="w-full rounded-lg border border-slate-800 object-contain" />
                    <p class="text-xs text-slate-400 break-all">{file.path}</p>
                    <p class="text-[10px] text-slate-600">{size}</p>
                </div>
            }
            .into_any();
        }
        return view! {
            <p class="text-sm text-slate-500">"Image preview unavailable for this file."</p>
        }
        .into_any();
    }

    let content = file.payload.content.unwrap_or_else(|| "No content".to_string());
    view! {
        <div class="space-y-3">
            <p class="text-xs text-slate-400 break-all font-semibold">{file.path}</p>
            <pre class="text-xs text-slate-300 bg-slate-900 border border-slate-800 rounded-lg p-3 whitespace-pre-wrap max-h-[60vh] overflow-auto">{content}</pre>
            <p class="text-[10px] text-slate-600">{size}</p>
        </div>
    }
    .into_any()
}
