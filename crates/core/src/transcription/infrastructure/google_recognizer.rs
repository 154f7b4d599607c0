use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::shared::constants::{ASR_SAMPLE_RATE, DEFAULT_ASR_LOCATION, DEFAULT_RECOGNIZER_ID};
use crate::transcription::domain::decoding::DecodingConfig;
use crate::transcription::domain::transcriber::{ClipTranscriber, TranscribeError};

/// Google Cloud Speech v2 client over the REST surface.
///
/// Identity is resolved once at construction: project id from
/// `GOOGLE_CLOUD_PROJECT`/`GOOGLE_CLOUD_QUOTA_PROJECT` or the service
/// account key's `project_id`, location from `GOOGLE_CLOUD_LOCATION`,
/// recognizer from `GOOGLE_CLOUD_RECOGNIZER` (a full resource name passes
/// through untouched). The recognizer is created on first use when absent
/// and permitted.
///
/// Clips are assumed to be 16 kHz mono PCM s16le; frames are uploaded
/// inline with an explicit decoding config.
pub struct GoogleRecognizer {
    http: reqwest::blocking::Client,
    endpoint: String,
    project_id: String,
    location: String,
    recognizer_name: String,
    /// Empty when the caller supplied a full resource name; such
    /// recognizers are never auto-provisioned.
    recognizer_id: String,
    language: String,
    model: String,
    token: String,
    provisioned: AtomicBool,
}

impl GoogleRecognizer {
    pub fn from_env(
        credentials_path: Option<&Path>,
        language: &str,
        model: &str,
    ) -> Result<Self, TranscribeError> {
        let location = resolve_location();
        let project_id = resolve_project_id(credentials_path)?;
        let (recognizer_name, recognizer_id) = resolve_recognizer_name(&project_id, &location);
        let token = resolve_access_token()?;

        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| TranscribeError::Service(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint_for(&location),
            project_id,
            location,
            recognizer_name,
            recognizer_id,
            language: language.to_string(),
            model: model.to_string(),
            token,
            provisioned: AtomicBool::new(false),
        })
    }

    /// Get the recognizer, creating it on 404. Full-resource-name
    /// recognizers are taken as-is.
    fn ensure_recognizer(&self) -> Result<(), TranscribeError> {
        if self.recognizer_id.is_empty() || self.provisioned.load(Ordering::Relaxed) {
            return Ok(());
        }

        let url = format!("{}/v2/{}", self.endpoint, self.recognizer_name);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| TranscribeError::Service(e.to_string()))?;

        match response.status() {
            s if s.is_success() => {
                self.provisioned.store(true, Ordering::Relaxed);
                return Ok(());
            }
            reqwest::StatusCode::NOT_FOUND => {}
            reqwest::StatusCode::UNAUTHORIZED => {
                return Err(TranscribeError::Credentials(body_message(response)));
            }
            reqwest::StatusCode::FORBIDDEN => {
                return Err(TranscribeError::PermissionDenied(body_message(response)));
            }
            _ => return Err(TranscribeError::Service(body_message(response))),
        }

        log::info!(
            "recognizer {} not found, creating it",
            self.recognizer_name
        );
        let create_url = format!(
            "{}/v2/projects/{}/locations/{}/recognizers?recognizerId={}",
            self.endpoint, self.project_id, self.location, self.recognizer_id
        );
        let body = CreateRecognizerRequest {
            default_recognition_config: RecognitionConfig::new(
                DecodingConfig::AutoDetect,
                &self.language,
                &self.model,
            ),
        };
        let response = self
            .http
            .post(&create_url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .map_err(|e| TranscribeError::Service(e.to_string()))?;

        if response.status() == reqwest::StatusCode::FORBIDDEN {
            return Err(TranscribeError::PermissionDenied(format!(
                "recognizer does not exist and cannot be created; grant the service \
                 account the Speech-to-Text Admin role or create a recognizer in the \
                 {} location and set GOOGLE_CLOUD_RECOGNIZER to its ID ({})",
                self.location,
                body_message(response)
            )));
        }
        if !response.status().is_success() {
            return Err(TranscribeError::Recognizer(body_message(response)));
        }

        // Creation is a long-running operation; wait for the resource to
        // become fetchable before the first recognize call.
        for _ in 0..30 {
            std::thread::sleep(Duration::from_secs(1));
            let ready = self
                .http
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .map_err(|e| TranscribeError::Service(e.to_string()))?;
            if ready.status().is_success() {
                self.provisioned.store(true, Ordering::Relaxed);
                return Ok(());
            }
        }
        Err(TranscribeError::Recognizer(format!(
            "recognizer {} did not become ready",
            self.recognizer_name
        )))
    }
}

impl ClipTranscriber for GoogleRecognizer {
    fn transcribe(&self, clip: &Path) -> Result<String, TranscribeError> {
        let frames = read_pcm_frames(clip)?;
        self.ensure_recognizer()?;

        let url = format!("{}/v2/{}:recognize", self.endpoint, self.recognizer_name);
        let body = RecognizeRequest {
            config: RecognitionConfig::new(
                DecodingConfig::ExplicitPcm16kMono,
                &self.language,
                &self.model,
            ),
            content: base64::engine::general_purpose::STANDARD.encode(&frames),
        };
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .map_err(|e| TranscribeError::Service(e.to_string()))?;

        match response.status() {
            s if s.is_success() => {}
            reqwest::StatusCode::UNAUTHORIZED => {
                return Err(TranscribeError::Credentials(body_message(response)));
            }
            reqwest::StatusCode::FORBIDDEN => {
                return Err(TranscribeError::PermissionDenied(body_message(response)));
            }
            reqwest::StatusCode::NOT_FOUND => {
                return Err(TranscribeError::Recognizer(body_message(response)));
            }
            _ => return Err(TranscribeError::Service(body_message(response))),
        }

        let recognized: RecognizeResponse = response
            .json()
            .map_err(|e| TranscribeError::Service(e.to_string()))?;
        Ok(join_transcripts(&recognized))
    }
}

fn resolve_location() -> String {
    std::env::var("GOOGLE_CLOUD_LOCATION")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_ASR_LOCATION.to_string())
}

fn endpoint_for(location: &str) -> String {
    if location == "global" {
        "https://speech.googleapis.com".to_string()
    } else {
        format!("https://{location}-speech.googleapis.com")
    }
}

fn resolve_project_id(credentials_path: Option<&Path>) -> Result<String, TranscribeError> {
    for key in ["GOOGLE_CLOUD_PROJECT", "GOOGLE_CLOUD_QUOTA_PROJECT"] {
        if let Ok(value) = std::env::var(key) {
            let value = value.trim().to_string();
            if !value.is_empty() {
                return Ok(value);
            }
        }
    }
    if let Some(path) = credentials_path {
        if let Ok(content) = std::fs::read_to_string(path) {
            if let Some(project_id) = project_id_from_credentials(&content) {
                return Ok(project_id);
            }
        }
    }
    Err(TranscribeError::ProjectId)
}

/// `project_id` field of a service-account key document, if present.
fn project_id_from_credentials(content: &str) -> Option<String> {
    let doc: serde_json::Value = serde_json::from_str(content).ok()?;
    doc.get("project_id")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// `(full resource name, recognizer id)`; the id is empty when the caller
/// supplied a full name, which disables auto-provisioning.
fn resolve_recognizer_name(project_id: &str, location: &str) -> (String, String) {
    if let Ok(value) = std::env::var("GOOGLE_CLOUD_RECOGNIZER") {
        let value = value.trim().to_string();
        if !value.is_empty() {
            if value.starts_with("projects/") {
                return (value, String::new());
            }
            return (
                format!("projects/{project_id}/locations/{location}/recognizers/{value}"),
                value,
            );
        }
    }
    (
        format!("projects/{project_id}/locations/{location}/recognizers/{DEFAULT_RECOGNIZER_ID}"),
        DEFAULT_RECOGNIZER_ID.to_string(),
    )
}

/// Bearer token: `GOOGLE_CLOUD_ACCESS_TOKEN` when set, else whatever
/// `gcloud auth print-access-token` yields for the ambient account.
fn resolve_access_token() -> Result<String, TranscribeError> {
    if let Ok(token) = std::env::var("GOOGLE_CLOUD_ACCESS_TOKEN") {
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Ok(token);
        }
    }
    let output = Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .map_err(|e| {
            TranscribeError::Credentials(format!(
                "set GOOGLE_CLOUD_ACCESS_TOKEN or install gcloud ({e})"
            ))
        })?;
    if !output.status.success() {
        return Err(TranscribeError::Credentials(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(TranscribeError::Credentials(
            "gcloud returned an empty access token".to_string(),
        ));
    }
    Ok(token)
}

/// Raw little-endian PCM frames of a clip, headers stripped.
fn read_pcm_frames(clip: &Path) -> Result<Vec<u8>, TranscribeError> {
    let mut reader = hound::WavReader::open(clip).map_err(|source| TranscribeError::Audio {
        path: clip.to_path_buf(),
        source,
    })?;
    let mut frames = Vec::with_capacity(reader.len() as usize * 2);
    for sample in reader.samples::<i16>() {
        let sample = sample.map_err(|source| TranscribeError::Audio {
            path: clip.to_path_buf(),
            source,
        })?;
        frames.extend_from_slice(&sample.to_le_bytes());
    }
    Ok(frames)
}

fn body_message(response: reqwest::blocking::Response) -> String {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or(body);
    format!("{status}: {}", detail.trim())
}

fn join_transcripts(response: &RecognizeResponse) -> String {
    let mut parts = Vec::new();
    for result in &response.results {
        if let Some(alternative) = result.alternatives.first() {
            if !alternative.transcript.is_empty() {
                parts.push(alternative.transcript.as_str());
            }
        }
    }
    parts.join(" ").trim().to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRecognizerRequest {
    default_recognition_config: RecognitionConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest {
    config: RecognitionConfig,
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    auto_decoding_config: Option<AutoDecodingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    explicit_decoding_config: Option<ExplicitDecodingConfig>,
    language_codes: Vec<String>,
    model: String,
}

impl RecognitionConfig {
    fn new(decoding: DecodingConfig, language: &str, model: &str) -> Self {
        let (auto, explicit) = match decoding {
            DecodingConfig::AutoDetect => (Some(AutoDecodingConfig {}), None),
            DecodingConfig::ExplicitPcm16kMono => (
                None,
                Some(ExplicitDecodingConfig {
                    encoding: "LINEAR16".to_string(),
                    sample_rate_hertz: ASR_SAMPLE_RATE,
                    audio_channel_count: 1,
                }),
            ),
        };
        Self {
            auto_decoding_config: auto,
            explicit_decoding_config: explicit,
            language_codes: vec![language.to_string()],
            model: model.to_string(),
        }
    }
}

#[derive(Serialize)]
struct AutoDecodingConfig {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExplicitDecodingConfig {
    encoding: String,
    sample_rate_hertz: u32,
    audio_channel_count: u32,
}

#[derive(Deserialize, Default)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognizeResult>,
}

#[derive(Deserialize)]
struct RecognizeResult {
    #[serde(default)]
    alternatives: Vec<RecognizeAlternative>,
}

#[derive(Deserialize)]
struct RecognizeAlternative {
    #[serde(default)]
    transcript: String,
}
