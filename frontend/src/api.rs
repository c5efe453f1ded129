//! REST client for the preplab backend.
//!
//! Every fetcher returns `Result<T, String>` with a user-presentable
//! message; components decide how to surface failures.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use preplab_core::browse::{FolderNode, LabelMatches};
use preplab_core::models::ImageFile;
use preplab_core::{DataPreview, Row, UploadResponse};

/// Uploads that take longer than this are aborted client-side.
const UPLOAD_TIMEOUT_MS: u32 = 120_000;

/// Multipart upload of a single file plus the two selection parameters.
pub async fn upload_files(
    file: web_sys::File,
    model_type: String,
    model_action: String,
) -> Result<UploadResponse, String> {
    let form = web_sys::FormData::new().map_err(|_| "could not build form data".to_string())?;
    form.append_with_blob("files", &file)
        .map_err(|_| "could not attach the selected file".to_string())?;
    form.append_with_str("model_type", &model_type)
        .map_err(|_| "could not attach model type".to_string())?;
    form.append_with_str("model_action", &model_action)
        .map_err(|_| "could not attach model action".to_string())?;

    let controller = web_sys::AbortController::new().ok();
    let signal = controller.as_ref().map(|c| c.signal());
    let timeout = controller.clone().map(|c| {
        gloo_timers::callback::Timeout::new(UPLOAD_TIMEOUT_MS, move || c.abort())
    });

    let send_result = gloo_net::http::Request::post("/api/upload")
        .abort_signal(signal.as_ref())
        .body(form)
        .map_err(|e| e.to_string())?
        .send()
        .await;
    if let Some(timeout) = timeout {
        timeout.cancel();
    }

    let resp = send_result.map_err(|e| {
        let msg = e.to_string();
        if msg.to_lowercase().contains("abort") {
            "Upload timed out: the server took too long to process this file. \
             Try again or use a smaller file."
                .to_string()
        } else {
            format!("Network error: {msg}. Please check that the server is running.")
        }
    })?;

    if !resp.ok() {
        let detail = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Value>(&detail)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
            .unwrap_or_else(|| resp.status_text());
        return Err(format!("Upload failed: HTTP {} - {}", resp.status(), detail));
    }

    let text = resp.text().await.map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

/// Data preview or, with `full`, the complete dataset.
pub async fn fetch_data(file_id: &str, full: bool) -> Result<DataPreview, String> {
    let url = if full {
        format!("/api/data/{file_id}?full=true")
    } else {
        format!("/api/data/{file_id}")
    };
    let resp = gloo_net::http::Request::get(&url)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !resp.ok() {
        return Err(format!("Error fetching data: {}", resp.status()));
    }

    let text = resp.text().await.map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

pub async fn fetch_image_structure(file_id: &str) -> Result<FolderNode, String> {
    let resp = gloo_net::http::Request::get(&format!("/api/images/{file_id}/structure"))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !resp.ok() {
        let detail = resp.text().await.unwrap_or_default();
        return Err(format!(
            "Failed to load folder structure: {} {}",
            resp.status(),
            detail
        ));
    }

    let text = resp.text().await.map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

/// Label matches are optional decoration; failures degrade to "none".
pub async fn fetch_image_matches(file_id: &str) -> Option<LabelMatches> {
    let resp = gloo_net::http::Request::get(&format!("/api/images/{file_id}/match"))
        .send()
        .await
        .ok()?;
    if !resp.ok() {
        return None;
    }
    let text = resp.text().await.ok()?;
    serde_json::from_str(&text).ok()
}

pub async fn fetch_image_file(file_id: &str, path: &str) -> Result<ImageFile, String> {
    let encoded = js_sys::encode_uri_component(path);
    let resp = gloo_net::http::Request::get(&format!("/api/images/{file_id}/file/{encoded}"))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !resp.ok() {
        return Err(format!("Error fetching file: {}", resp.status()));
    }

    let text = resp.text().await.map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

#[derive(Clone, Debug, Serialize)]
pub struct TrainRequest {
    pub data: Vec<Row>,
    pub features: Vec<String>,
    pub label: String,
    pub model_ids: Vec<String>,
    pub task: String,
    pub train_split_percentage: u32,
    pub test_split_percentage: u32,
    pub null_handling_method: String,
}

#[derive(Clone, Debug, Deserialize, Default, PartialEq)]
pub struct ModelResult {
    #[serde(default)]
    pub model_id: String,
    #[serde(default)]
    pub metrics: serde_json::Map<String, Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub train_size: Option<u64>,
    #[serde(default)]
    pub test_size: Option<u64>,
}

#[derive(Clone, Debug, Deserialize, Default, PartialEq)]
pub struct TrainResponse {
    #[serde(default)]
    pub results: Vec<ModelResult>,
}

pub async fn train_models(request: &TrainRequest) -> Result<TrainResponse, String> {
    let resp = gloo_net::http::Request::post("/api/train")
        .json(request)
        .map_err(|e| e.to_string())?
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !resp.ok() {
        let detail = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Value>(&detail)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
            .unwrap_or(detail);
        return Err(format!("Training failed: HTTP {} - {}", resp.status(), detail));
    }

    let text = resp.text().await.map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}
