//! VibeCheck CLI: command-line client for the interview analysis service.
//!
//! Set VIBECHECK_API_TOKEN and VIBECHECK_API_URL (or API_URL). Uses Bearer auth.
//! Ctrl-C stops an active status watch; the job keeps running server-side and
//! can be followed again with `vibecheck watch <job-id>`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vibecheck_api_client::ApiClient;
use vibecheck_cli::{failure_summary, format_job_row, init_tracing, job_table_header};
use vibecheck_core::{
    Artifact, ClientConfig, CreateInterviewer, Credential, InterviewerGateway, InterviewerId,
    JobGateway, JobId, JobListQuery, JobStatus,
};
use vibecheck_services::{
    FlowError, JobListView, JobOutcome, JobTracker, ResultFetcher, TrackError, UploadOrchestrator,
};
use vibecheck_storage::{DirectUploader, TransferProgress};
use vibecheck_worker::PollerConfig;

#[derive(Parser)]
#[command(name = "vibecheck", about = "VibeCheck interview analysis CLI")]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a recording and follow its analysis job
    Upload {
        /// Path to the audio or video file
        file: PathBuf,
        /// Interviewer UUID the recording belongs to
        #[arg(long)]
        interviewer: InterviewerId,
        /// Content type; inferred from the extension when omitted
        #[arg(long)]
        content_type: Option<String>,
        /// Return as soon as processing has started
        #[arg(long)]
        no_wait: bool,
    },
    /// Follow an existing job until it completes or fails
    Watch {
        /// Job UUID
        job_id: JobId,
    },
    /// List jobs
    Jobs {
        /// Filter by status: pending, completed, failed
        #[arg(long)]
        status: Option<JobStatus>,
        /// Maximum number of items
        #[arg(long)]
        limit: Option<u32>,
        /// Offset for pagination
        #[arg(long)]
        offset: Option<u32>,
        /// Output format: json or table
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Get the analysis of a completed job
    Analysis {
        /// Job UUID
        job_id: JobId,
    },
    /// Interviewer operations
    Interviewers {
        #[command(subcommand)]
        sub: InterviewerCommands,
    },
}

#[derive(Subcommand)]
enum InterviewerCommands {
    /// List interviewers
    List,
    /// Create an interviewer
    Create {
        /// Display name
        name: String,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Cancel `token` on the first Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping");
            cancel.cancel();
        }
    });
    token
}

/// Print upload progress on stderr until the transfer is done.
fn show_progress(progress: &TransferProgress) {
    let mut rx = progress.subscribe();
    tokio::spawn(async move {
        loop {
            let percent = *rx.borrow_and_update();
            eprint!("\rUploading... {:>3}%", percent);
            if percent >= 100 || rx.changed().await.is_err() {
                eprintln!();
                break;
            }
        }
    });
}

fn print_outcome(outcome: &JobOutcome) -> anyhow::Result<()> {
    match outcome {
        JobOutcome::Completed { job, analysis } => print_json(&serde_json::json!({
            "job_id": job.id,
            "status": job.status,
            "analysis": analysis,
        })),
        JobOutcome::Failed { job } => print_json(&serde_json::json!({
            "job_id": job.id,
            "status": job.status,
            "error_message": job.error_message,
        })),
    }
}

/// Report a tracking failure. A cancelled watch is not an error for the CLI.
fn finish_flow(result: Result<JobOutcome, FlowError>) -> anyhow::Result<()> {
    match result {
        Ok(outcome) => print_outcome(&outcome),
        Err(FlowError::Track {
            job_id,
            source: TrackError::Cancelled { .. },
        }) => print_json(&serde_json::json!({
            "job_id": job_id,
            "status": "WATCH_CANCELLED",
            "resume": format!("vibecheck watch {}", job_id),
        })),
        Err(err) => {
            let summary = failure_summary(&err);
            let resume = err
                .job_id()
                .map(|id| format!(" (job {})", id))
                .unwrap_or_default();
            Err(anyhow::Error::new(err).context(format!("{}{}", summary, resume)))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = ClientConfig::from_env().context("Invalid client configuration")?;
    let token = config
        .api_token
        .clone()
        .context("VIBECHECK_API_TOKEN (or API_TOKEN) must be set")?;
    let credential = Credential::Bearer(token);

    let client = Arc::new(ApiClient::from_config(&config).context(
        "Failed to create API client. Check VIBECHECK_API_URL (or API_URL)",
    )?);
    let view = Arc::new(JobListView::new(client.clone()));
    let tracker = JobTracker::new(client.clone(), PollerConfig::from(&config))
        .with_view(view.clone());

    match cli.command {
        Commands::Upload {
            file,
            interviewer,
            content_type,
            no_wait,
        } => {
            let artifact = Artifact::from_path(&file, content_type)
                .with_context(|| format!("Failed to open {}", file.display()))?;
            let uploader =
                DirectUploader::from_config(&config).context("Failed to create uploader")?;
            let orchestrator =
                UploadOrchestrator::new(client.clone(), Arc::new(uploader), tracker);

            let (progress, _rx) = TransferProgress::channel();
            show_progress(&progress);

            if no_wait {
                let job_id = orchestrator
                    .submit(&credential, &artifact, interviewer, &progress)
                    .await
                    .map_err(|err| {
                        let summary = failure_summary(&err);
                        anyhow::Error::new(err).context(summary)
                    })?;
                print_json(&serde_json::json!({
                    "job_id": job_id,
                    "status": JobStatus::Pending,
                }))?;
            } else {
                let cancel = cancel_on_interrupt();
                let result = orchestrator
                    .run(&credential, &artifact, interviewer, &progress, &cancel)
                    .await;
                finish_flow(result)?;
            }
        }
        Commands::Watch { job_id } => {
            let cancel = cancel_on_interrupt();
            let result = tracker
                .track(&credential, job_id, &cancel)
                .await
                .map_err(|source| FlowError::Track { job_id, source });
            finish_flow(result)?;
        }
        Commands::Jobs {
            status,
            limit,
            offset,
            format,
        } => {
            let query = JobListQuery {
                status,
                limit,
                offset,
            };
            let jobs = view
                .refresh(&credential, &query)
                .await
                .context("Failed to list jobs")?;
            match format.as_str() {
                "json" => print_json(&jobs)?,
                _ => {
                    println!("{}", job_table_header());
                    for job in &jobs {
                        println!("{}", format_job_row(job));
                    }
                    println!("\n{} job(s)", jobs.len());
                }
            }
        }
        Commands::Analysis { job_id } => {
            let job = client
                .job_status(&credential, job_id)
                .await
                .with_context(|| format!("Failed to get job {}", job_id))?;
            let analysis = ResultFetcher::new(client.clone())
                .fetch(&credential, &job)
                .await
                .map_err(|err| {
                    let summary = failure_summary(&err);
                    anyhow::Error::new(err).context(summary)
                })?;
            print_json(&analysis)?;
        }
        Commands::Interviewers { sub } => match sub {
            InterviewerCommands::List => {
                let interviewers = client
                    .list_interviewers(&credential)
                    .await
                    .context("Failed to list interviewers")?;
                print_json(&interviewers)?;
            }
            InterviewerCommands::Create {
                name,
                company,
                email,
            } => {
                let request = CreateInterviewer {
                    name,
                    company,
                    email,
                };
                let interviewer = client
                    .create_interviewer(&credential, &request)
                    .await
                    .context("Failed to create interviewer")?;
                print_json(&interviewer)?;
            }
        },
    }

    Ok(())
}
