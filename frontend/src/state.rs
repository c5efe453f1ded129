//! Application context: the shared state signals and the actions that
//! mutate them. Components read state through this context instead of
//! ambient globals; all workflow decisions are delegated to preplab-core.

use leptos::prelude::*;
use leptos::task::spawn_local;

use preplab_core::browse::ImageSession;
use preplab_core::nav::{self, NavOutcome};
use preplab_core::store::keys;
use preplab_core::{AppData, Pager, Step, TimeSeriesSession};

use crate::api;
use crate::storage;

#[derive(Clone, Copy)]
pub struct AppCtx {
    pub data: RwSignal<AppData>,
    pub active_step: RwSignal<Step>,
    pub nav_warning: RwSignal<Option<String>>,
    pub pager: RwSignal<Pager>,
    pub ts_session: RwSignal<Option<TimeSeriesSession>>,
    pub image_session: RwSignal<ImageSession>,
    /// True while a background full-dataset fetch is in flight; drives
    /// the corner notice.
    pub fetching_full: RwSignal<bool>,
}

impl AppCtx {
    /// Restore the previous session from storage, register the context,
    /// and kick off session healing where it applies.
    pub fn init() -> Self {
        let store = storage::store();
        let data = store.restore_app_data();
        let is_imaging = store.restored_session_is_imaging(&data);
        let ts_session = store.restore_opt::<TimeSeriesSession>(keys::TIME_SERIES_DATA);
        let image_session = if is_imaging {
            store.restore_json::<ImageSession>(keys::IMAGE_DATA)
        } else {
            ImageSession::default()
        };

        if data.upload.is_some() {
            log::info!(
                "restored session: {} row(s), {} column(s), {} feature(s)",
                data.rows.len(),
                data.columns.len(),
                data.created_features.len()
            );
        }

        // A descriptor without resident rows means the dataset was too big
        // for storage; refetch it so the session comes back to life.
        let heal_file_id = data
            .upload
            .as_ref()
            .filter(|_| !is_imaging && data.rows.is_empty())
            .and_then(|u| u.primary_file_id())
            .map(String::from);

        let ctx = AppCtx {
            data: RwSignal::new(data),
            active_step: RwSignal::new(Step::Upload),
            nav_warning: RwSignal::new(None),
            pager: RwSignal::new(Pager::default()),
            ts_session: RwSignal::new(ts_session),
            image_session: RwSignal::new(image_session),
            fetching_full: RwSignal::new(false),
        };
        provide_context(ctx);

        if let Some(file_id) = heal_file_id {
            ctx.spawn_full_fetch(file_id);
        }
        ctx
    }

    pub fn expect() -> Self {
        use_context::<AppCtx>().expect("AppCtx not provided")
    }

    /// User navigation: the availability guard applies. A blocked attempt
    /// re-checks once after a short beat (late-arriving fetches count),
    /// then falls back to the upload step with a warning.
    pub fn navigate(self, requested: Step) {
        match self.data.with_untracked(|d| nav::navigate(d, requested)) {
            NavOutcome::Activated(step) => {
                self.nav_warning.set(None);
                self.active_step.set(step);
            }
            NavOutcome::FellBack { .. } => {
                spawn_local(async move {
                    gloo_timers::future::TimeoutFuture::new(150).await;
                    let outcome = self.data.with_untracked(|d| nav::navigate(d, requested));
                    match outcome {
                        NavOutcome::Activated(step) => {
                            self.nav_warning.set(None);
                            self.active_step.set(step);
                        }
                        NavOutcome::FellBack { .. } => {
                            self.nav_warning.set(outcome.warning());
                            self.active_step.set(Step::Upload);
                        }
                    }
                });
            }
        }
    }

    /// Activation without the guard, used by the upload flow right after
    /// a successful upload (the moment the original showed the viewer
    /// directly). User clicks always go through [`AppCtx::navigate`].
    pub fn activate(self, step: Step) {
        self.nav_warning.set(None);
        self.active_step.set(step);
    }

    /// Load the complete dataset for `file_id` into the cache.
    ///
    /// Coalescing and staleness both live in the core cache: a concurrent
    /// call while one is in flight gets no ticket and simply returns, and
    /// a result landing after a reset is dropped.
    pub async fn load_full_dataset(self, file_id: String) -> bool {
        let Some(ticket) = self
            .data
            .try_update(|d| d.begin_full_fetch(&file_id))
            .flatten()
        else {
            return self.data.with_untracked(|d| d.full_dataset_loaded());
        };

        self.fetching_full.set(true);
        let result = api::fetch_data(&file_id, true).await;
        self.fetching_full.set(false);

        match result {
            Ok(preview) if preview.is_tabular() && !preview.data.is_empty() => {
                let applied = self
                    .data
                    .try_update(|d| {
                        let ok =
                            d.finish_full_fetch(ticket, preview.data, preview.columns, preview.shape);
                        if ok {
                            storage::persist_dataset(d);
                        }
                        ok
                    })
                    .unwrap_or(false);
                if applied {
                    log::info!("full dataset loaded for {file_id}");
                }
                applied
            }
            Ok(_) => {
                log::warn!("full dataset response for {file_id} had no tabular rows");
                self.data.update(|d| d.abort_full_fetch(&ticket));
                false
            }
            Err(err) => {
                log::error!("full dataset fetch failed for {file_id}: {err}");
                self.data.update(|d| d.abort_full_fetch(&ticket));
                false
            }
        }
    }

    pub fn spawn_full_fetch(self, file_id: String) {
        spawn_local(async move {
            self.load_full_dataset(file_id).await;
        });
    }

    /// "Start new upload": clear cache and storage wholesale. The
    /// selected model type survives in both.
    pub fn start_new_upload(self) {
        self.data.update(|d| d.reset());
        storage::store().clear_dataset_keys();
        self.ts_session.set(None);
        self.image_session.set(ImageSession::default());
        self.pager.set(Pager::default());
        self.nav_warning.set(None);
        self.active_step.set(Step::Upload);
        log::info!("cached data cleared; model type selection preserved");
    }

    pub fn persist(self) {
        self.data.with_untracked(|d| storage::persist_dataset(d));
    }
}
