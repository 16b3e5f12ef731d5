use vibecheck_core::{ErrorMetadata, Job};

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// One line of the `jobs` table.
pub fn format_job_row(job: &Job) -> String {
    format!(
        "{:<36}  {:<9}  {:<19}  {}",
        job.id,
        job.status,
        job.created_at.format("%Y-%m-%d %H:%M:%S"),
        truncate_string(job.filename.as_deref().unwrap_or("-"), 40)
    )
}

pub fn job_table_header() -> String {
    format!(
        "{:<36}  {:<9}  {:<19}  {}",
        "ID", "STATUS", "CREATED", "FILENAME"
    )
}

/// User-facing summary of a failure: message, code and what to do about it.
pub fn failure_summary(err: &dyn ErrorMetadata) -> String {
    let kind = if err.is_user_correctable() {
        "fix the input and try again"
    } else if err.is_recoverable() {
        "temporary, retrying may help"
    } else {
        "not retryable"
    };
    let mut summary = format!("{} [{}; {}]", err.client_message(), err.error_code(), kind);
    if let Some(action) = err.suggested_action() {
        summary.push_str(". ");
        summary.push_str(action);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use vibecheck_core::{GatewayError, JobId, JobStatus, TicketRequestError};

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_exact() {
        assert_eq!(truncate_string("hello", 5), "hello");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        // max_len=2: 2-3=0 chars before "..."
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_multibyte() {
        assert_eq!(truncate_string("entrevista_señor.mp4", 10), "entrevi...");
    }

    #[test]
    fn job_row_shows_status_and_filename() {
        let job = Job {
            id: JobId::new(),
            status: JobStatus::Completed,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
            filename: Some("interview.mp4".to_string()),
            error_message: None,
            updated_at: None,
        };

        let row = format_job_row(&job);
        assert!(row.contains("COMPLETED"));
        assert!(row.contains("2026-03-01 09:30:00"));
        assert!(row.ends_with("interview.mp4"));
    }

    #[test]
    fn failure_summary_distinguishes_causes() {
        let invalid = TicketRequestError::Invalid("Unsupported content type".to_string());
        assert!(failure_summary(&invalid).contains("fix the input"));

        let unavailable = GatewayError::Status {
            status: 503,
            detail: "Service Unavailable".to_string(),
        };
        let summary = failure_summary(&unavailable);
        assert!(summary.contains("temporary"));
        assert!(summary.ends_with("Retry after a short delay"));
    }
}

/// Initialize tracing for the CLI. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
