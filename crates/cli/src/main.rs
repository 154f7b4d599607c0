use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use tiercut_core::annotation::infrastructure::textgrid_reader::TextGridReader;
use tiercut_core::pipeline::infrastructure::batch_runner::{
    spawn_split, spawn_transcribe, BatchSlot, WorkerMessage,
};
use tiercut_core::pipeline::split_audio_use_case::SplitAudioUseCase;
use tiercut_core::pipeline::transcribe_batch_use_case::TranscribeBatchUseCase;
use tiercut_core::project::domain::project::Project;
use tiercut_core::project::infrastructure::json_store::{
    load_project, project_file_exists, project_file_path, save_project,
};
use tiercut_core::shared::constants::DEFAULT_LANGUAGE;
use tiercut_core::splitting::infrastructure::ffmpeg_encoder::FfmpegEncoder;
use tiercut_core::transcription::infrastructure::google_recognizer::GoogleRecognizer;

/// Split a recording into per-interval clips by its TextGrid, transcribe
/// them, and track verification.
#[derive(Parser)]
#[command(name = "tiercut")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Split audio into one clip per labeled TextGrid interval.
    Split {
        /// Source audio file (any container/codec ffmpeg can read).
        audio: PathBuf,

        /// TextGrid annotation file.
        textgrid: PathBuf,

        /// Output directory (default: `splits` next to the audio file).
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Overwrite an existing project file without asking.
        #[arg(long)]
        yes: bool,
    },

    /// Run ASR over every non-verified segment of a project.
    Transcribe {
        /// Project file written by `split`.
        project: PathBuf,

        /// ASR model identifier (persisted in the project).
        #[arg(long)]
        model: Option<String>,

        /// Google Cloud service account key (persisted in the project).
        #[arg(long)]
        credentials: Option<PathBuf>,

        /// Language tag for recognition.
        #[arg(long, default_value = DEFAULT_LANGUAGE)]
        language: String,
    },

    /// List a project's segments and their verification status.
    Status {
        project: PathBuf,
    },

    /// Mark a segment's transcript as human-verified.
    Verify {
        project: PathBuf,

        /// Clip filename, as shown by `status`.
        clip_name: String,

        /// Clear the verification flag instead.
        #[arg(long)]
        revoke: bool,
    },

    /// Replace a segment's transcript with hand-typed text.
    SetTranscript {
        project: PathBuf,
        clip_name: String,
        text: String,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    match Cli::parse().command {
        Command::Split {
            audio,
            textgrid,
            output_dir,
            yes,
        } => run_split(&audio, &textgrid, output_dir, yes),
        Command::Transcribe {
            project,
            model,
            credentials,
            language,
        } => run_transcribe(&project, model, credentials, &language),
        Command::Status { project } => run_status(&project),
        Command::Verify {
            project,
            clip_name,
            revoke,
        } => run_verify(&project, &clip_name, revoke),
        Command::SetTranscript {
            project,
            clip_name,
            text,
        } => run_set_transcript(&project, &clip_name, text),
    }
}

fn run_split(
    audio: &Path,
    textgrid: &Path,
    output_dir: Option<PathBuf>,
    yes: bool,
) -> Result<(), Box<dyn Error>> {
    if !audio.is_file() || !textgrid.is_file() {
        return Err("select valid audio and TextGrid files".into());
    }

    let encoder = match FfmpegEncoder::probe() {
        Ok(encoder) => encoder,
        Err(e) => {
            // Splitting is disabled without ffmpeg; re-running re-probes.
            println!("ffmpeg is required to split audio: {e}");
            process::exit(1);
        }
    };

    let output_dir = output_dir.unwrap_or_else(|| {
        audio
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("splits")
    });

    if project_file_exists(&output_dir) && !yes {
        let overwrite = confirm(
            "A project file already exists for this output directory. Resplitting \
             can overwrite saved transcripts and status. Continue? [y/N] ",
        )?;
        if !overwrite {
            println!("Split canceled.");
            return Ok(());
        }
    }

    let slot = BatchSlot::new();
    let Some(permit) = slot.try_acquire() else {
        println!("A split is already running.");
        return Ok(());
    };

    let use_case = SplitAudioUseCase::new(Box::new(TextGridReader::new()), Box::new(encoder));
    log::info!(
        "splitting {} with {} into {}",
        audio.display(),
        textgrid.display(),
        output_dir.display()
    );
    println!("Splitting audio...");
    let rx = spawn_split(
        use_case,
        audio.to_path_buf(),
        textgrid.to_path_buf(),
        output_dir.clone(),
        permit,
    );

    for message in rx {
        match message {
            WorkerMessage::Progress(done, total, name) => {
                println!("Split {done}/{total}: {name}");
            }
            WorkerMessage::SplitComplete(segments) => {
                let project = Project::from_split(
                    audio.to_path_buf(),
                    textgrid.to_path_buf(),
                    output_dir.clone(),
                    segments,
                );
                let project_path = project_file_path(&output_dir);
                save_project(&project_path, &project)?;
                println!(
                    "Split complete. {} segment(s), project saved to {}",
                    project.segments.len(),
                    project_path.display()
                );
            }
            WorkerMessage::Failed(message) => {
                return Err(format!("split failed: {message}").into());
            }
            _ => {}
        }
    }

    Ok(())
}

fn run_transcribe(
    project_path: &Path,
    model: Option<String>,
    credentials: Option<PathBuf>,
    language: &str,
) -> Result<(), Box<dyn Error>> {
    let mut project = load_project(project_path)?;

    // Model/credential choices are project settings; persist them.
    if let Some(model) = model {
        project.asr_model = model;
    }
    if let Some(credentials) = credentials {
        project.credentials_path = Some(credentials);
    }
    save_project(project_path, &project)?;

    let transcriber = GoogleRecognizer::from_env(
        project.credentials_path.as_deref(),
        language,
        &project.asr_model,
    )?;

    let slot = BatchSlot::new();
    let Some(permit) = slot.try_acquire() else {
        println!("ASR already running.");
        return Ok(());
    };

    let use_case = TranscribeBatchUseCase::new(Box::new(transcriber));
    println!("Batch ASR started ({} model).", project.asr_model);
    let rx = spawn_transcribe(use_case, project.segments.clone(), permit);

    for message in rx {
        match message {
            WorkerMessage::SegmentTranscribed {
                position,
                transcript,
            } => {
                project.segments[position].set_asr_transcript(transcript);
                if let Err(e) = save_project(project_path, &project) {
                    println!("Failed to save project: {e}");
                }
            }
            WorkerMessage::Progress(done, total, name) => {
                println!("ASR {done}/{total}: {name}");
            }
            WorkerMessage::TranscribeComplete { transcribed } => {
                if transcribed == 0 {
                    println!("No segments available for batch ASR.");
                } else {
                    println!("ASR complete. {transcribed} segment(s) transcribed.");
                }
            }
            WorkerMessage::Failed(message) => {
                return Err(format!("ASR failed: {message}").into());
            }
            _ => {}
        }
    }

    Ok(())
}

fn run_status(project_path: &Path) -> Result<(), Box<dyn Error>> {
    let project = load_project(project_path)?;
    let (_, _, verified) = project.status_counts();

    println!(
        "{} - {}/{} verified",
        project_path.display(),
        verified,
        project.segments.len()
    );
    println!("{:<40} {:<16} {:>9} {}", "File", "Tier", "Duration", "Status");
    for segment in &project.segments {
        println!(
            "{:<40} {:<16} {:>7}ms {}",
            segment.clip_name(),
            segment.tier,
            segment.duration_ms(),
            segment.status()
        );
    }

    Ok(())
}

fn run_verify(project_path: &Path, clip_name: &str, revoke: bool) -> Result<(), Box<dyn Error>> {
    let mut project = load_project(project_path)?;
    let segment = project
        .segment_by_clip_name(clip_name)
        .ok_or_else(|| format!("no segment named {clip_name}"))?;

    if !revoke && segment.transcript.trim().is_empty() {
        return Err(format!("{clip_name} has no transcript to verify").into());
    }
    segment.verified = !revoke;
    save_project(project_path, &project)?;
    println!("Verified set to {} for {clip_name}.", !revoke);

    Ok(())
}

fn run_set_transcript(
    project_path: &Path,
    clip_name: &str,
    text: String,
) -> Result<(), Box<dyn Error>> {
    let mut project = load_project(project_path)?;
    let segment = project
        .segment_by_clip_name(clip_name)
        .ok_or_else(|| format!("no segment named {clip_name}"))?;

    segment.set_manual_transcript(text);
    save_project(project_path, &project)?;
    println!("Transcript updated for {clip_name}.");

    Ok(())
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
