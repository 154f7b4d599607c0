use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::project::domain::project::Project;
use crate::project::domain::segment::Segment;
use crate::shared::constants::{DEFAULT_ASR_MODEL, PROJECT_FILENAME};
use crate::shared::paths::{relativize, resolve};

#[derive(Error, Debug)]
pub enum ProjectStoreError {
    #[error("failed to read project file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write project file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("project file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("project file has no parent directory: {0}")]
    NoParent(PathBuf),
}

/// On-disk schema. Paths are stored project-relative when the target lies
/// under the project file's directory, absolute otherwise; missing segment
/// fields default so documents written by earlier versions still load.
#[derive(Serialize, Deserialize)]
struct ProjectDoc {
    version: u32,
    audio_path: PathBuf,
    textgrid_path: PathBuf,
    output_dir: PathBuf,
    #[serde(default)]
    batch_asr: bool,
    #[serde(default)]
    credentials_path: PathBuf,
    #[serde(default = "default_asr_model")]
    asr_model: String,
    #[serde(default)]
    segments: Vec<SegmentDoc>,
}

#[derive(Serialize, Deserialize)]
struct SegmentDoc {
    tier: String,
    index: u32,
    start_ms: u64,
    end_ms: u64,
    path: PathBuf,
    #[serde(default)]
    mark: String,
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    asr_generated: bool,
    #[serde(default)]
    verified: bool,
}

fn default_asr_model() -> String {
    DEFAULT_ASR_MODEL.to_string()
}

/// Canonical project file location for an output directory.
pub fn project_file_path(output_dir: &Path) -> PathBuf {
    output_dir.join(PROJECT_FILENAME)
}

pub fn project_file_exists(output_dir: &Path) -> bool {
    project_file_path(output_dir).is_file()
}

pub fn save_project(project_path: &Path, project: &Project) -> Result<(), ProjectStoreError> {
    let base = project_path
        .parent()
        .ok_or_else(|| ProjectStoreError::NoParent(project_path.to_path_buf()))?;

    let doc = ProjectDoc {
        version: project.version,
        audio_path: relativize(&project.audio_path, base),
        textgrid_path: relativize(&project.textgrid_path, base),
        output_dir: relativize(&project.output_dir, base),
        batch_asr: project.batch_asr,
        credentials_path: project
            .credentials_path
            .as_deref()
            .map(|p| relativize(p, base))
            .unwrap_or_default(),
        asr_model: project.asr_model.clone(),
        segments: project
            .segments
            .iter()
            .map(|s| SegmentDoc {
                tier: s.tier.clone(),
                index: s.index,
                start_ms: s.start_ms,
                end_ms: s.end_ms,
                path: relativize(&s.path, base),
                mark: s.mark.clone(),
                transcript: s.transcript.clone(),
                asr_generated: s.asr_generated,
                verified: s.verified,
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&doc).map_err(|source| ProjectStoreError::Json {
        path: project_path.to_path_buf(),
        source,
    })?;
    fs::write(project_path, json).map_err(|source| ProjectStoreError::Write {
        path: project_path.to_path_buf(),
        source,
    })
}

pub fn load_project(project_path: &Path) -> Result<Project, ProjectStoreError> {
    let base = project_path
        .parent()
        .ok_or_else(|| ProjectStoreError::NoParent(project_path.to_path_buf()))?;

    let content = fs::read_to_string(project_path).map_err(|source| ProjectStoreError::Read {
        path: project_path.to_path_buf(),
        source,
    })?;
    let doc: ProjectDoc =
        serde_json::from_str(&content).map_err(|source| ProjectStoreError::Json {
            path: project_path.to_path_buf(),
            source,
        })?;

    let credentials_path = if doc.credentials_path.as_os_str().is_empty() {
        None
    } else {
        Some(resolve(&doc.credentials_path, base))
    };

    Ok(Project {
        version: doc.version,
        audio_path: resolve(&doc.audio_path, base),
        textgrid_path: resolve(&doc.textgrid_path, base),
        output_dir: resolve(&doc.output_dir, base),
        batch_asr: doc.batch_asr,
        credentials_path,
        asr_model: doc.asr_model,
        segments: doc
            .segments
            .into_iter()
            .map(|s| Segment {
                tier: s.tier,
                index: s.index,
                start_ms: s.start_ms,
                end_ms: s.end_ms,
                path: resolve(&s.path, base),
                mark: s.mark,
                transcript: s.transcript,
                asr_generated: s.asr_generated,
                verified: s.verified,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::PROJECT_VERSION;
    use tempfile::TempDir;

    fn sample_project(dir: &Path) -> Project {
        let mut project = Project::from_split(
            dir.join("session.mp3"),
            dir.join("session.TextGrid"),
            dir.to_path_buf(),
            vec![
                Segment {
                    tier: "words".to_string(),
                    index: 1,
                    start_ms: 1234,
                    end_ms: 2001,
                    path: dir.join("words/words_1_1234_2001.wav"),
                    mark: "hello".to_string(),
                    transcript: "hello there".to_string(),
                    asr_generated: true,
                    verified: false,
                },
                Segment {
                    tier: "words".to_string(),
                    index: 2,
                    start_ms: 2001,
                    end_ms: 3000,
                    path: dir.join("words/words_2_2001_3000.wav"),
                    mark: "world".to_string(),
                    transcript: String::new(),
                    asr_generated: false,
                    verified: false,
                },
            ],
        );
        project.credentials_path = Some(dir.join("key.json"));
        project
    }

    #[test]
    fn test_round_trip_reproduces_project() {
        let tmp = TempDir::new().unwrap();
        let project_path = project_file_path(tmp.path());
        let project = sample_project(tmp.path());

        save_project(&project_path, &project).unwrap();
        let loaded = load_project(&project_path).unwrap();
        assert_eq!(loaded, project);
    }

    #[test]
    fn test_save_load_save_is_stable() {
        let tmp = TempDir::new().unwrap();
        let project_path = project_file_path(tmp.path());
        let project = sample_project(tmp.path());

        save_project(&project_path, &project).unwrap();
        let first = fs::read_to_string(&project_path).unwrap();
        let loaded = load_project(&project_path).unwrap();
        save_project(&project_path, &loaded).unwrap();
        let second = fs::read_to_string(&project_path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_paths_under_project_dir_are_stored_relative() {
        let tmp = TempDir::new().unwrap();
        let project_path = project_file_path(tmp.path());
        save_project(&project_path, &sample_project(tmp.path())).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&project_path).unwrap()).unwrap();
        assert_eq!(json["audio_path"], "session.mp3");
        assert_eq!(
            json["segments"][0]["path"],
            "words/words_1_1234_2001.wav"
        );
    }

    #[test]
    fn test_outside_paths_fall_back_to_absolute() {
        let tmp = TempDir::new().unwrap();
        let project_path = project_file_path(tmp.path());
        let mut project = sample_project(tmp.path());
        project.audio_path = PathBuf::from("/elsewhere/session.mp3");

        save_project(&project_path, &project).unwrap();
        let loaded = load_project(&project_path).unwrap();
        assert_eq!(loaded.audio_path, PathBuf::from("/elsewhere/session.mp3"));
    }

    #[test]
    fn test_back_compat_defaults() {
        let tmp = TempDir::new().unwrap();
        let project_path = project_file_path(tmp.path());
        fs::write(
            &project_path,
            r#"{
                "version": 1,
                "audio_path": "a.mp3",
                "textgrid_path": "a.TextGrid",
                "output_dir": ".",
                "segments": [
                    {"tier": "t", "index": 1, "start_ms": 0, "end_ms": 1000,
                     "path": "t/t_1_0_1000.wav"}
                ]
            }"#,
        )
        .unwrap();

        let loaded = load_project(&project_path).unwrap();
        assert_eq!(loaded.asr_model, DEFAULT_ASR_MODEL);
        assert_eq!(loaded.credentials_path, None);
        assert!(!loaded.batch_asr);
        let s = &loaded.segments[0];
        assert_eq!(s.mark, "");
        assert_eq!(s.transcript, "");
        assert!(!s.asr_generated);
        assert!(!s.verified);
    }

    #[test]
    fn test_missing_required_key_fails_load() {
        let tmp = TempDir::new().unwrap();
        let project_path = project_file_path(tmp.path());
        fs::write(&project_path, r#"{"version": 1, "audio_path": "a.mp3"}"#).unwrap();
        let err = load_project(&project_path).unwrap_err();
        assert!(matches!(err, ProjectStoreError::Json { .. }));
    }

    #[test]
    fn test_invalid_json_fails_load() {
        let tmp = TempDir::new().unwrap();
        let project_path = project_file_path(tmp.path());
        fs::write(&project_path, "not json").unwrap();
        let err = load_project(&project_path).unwrap_err();
        assert!(matches!(err, ProjectStoreError::Json { .. }));
    }

    #[test]
    fn test_missing_file_fails_load() {
        let tmp = TempDir::new().unwrap();
        let err = load_project(&project_file_path(tmp.path())).unwrap_err();
        assert!(matches!(err, ProjectStoreError::Read { .. }));
    }

    #[test]
    fn test_project_file_exists() {
        let tmp = TempDir::new().unwrap();
        assert!(!project_file_exists(tmp.path()));
        fs::write(project_file_path(tmp.path()), "{}").unwrap();
        assert!(project_file_exists(tmp.path()));
    }

    #[test]
    fn test_version_is_persisted() {
        let tmp = TempDir::new().unwrap();
        let project_path = project_file_path(tmp.path());
        save_project(&project_path, &sample_project(tmp.path())).unwrap();
        let loaded = load_project(&project_path).unwrap();
        assert_eq!(loaded.version, PROJECT_VERSION);
    }
}
