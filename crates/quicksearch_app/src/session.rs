//! Scripted input session read line by line from stdin.

use std::io::{self, Write};
use std::time::Duration;

use quicksearch_core::{PagePhase, SearchViewModel};
use quicksearch_engine::{EventSink, RuntimeEvent, SearchHandle};
use quicksearch_logging::{search_debug, search_info, search_warn};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sets a text control; the value is the rest of the line and may be empty.
    Type { field: String, value: String },
    Check { field: String, value: String },
    Uncheck { field: String, value: String },
    Wait(Duration),
    Show,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}: unknown command `{command}`")]
    UnknownCommand { line: usize, command: String },
    #[error("line {line}: `{command}` expects {expected}")]
    MissingArgument {
        line: usize,
        command: &'static str,
        expected: &'static str,
    },
    #[error("line {line}: invalid wait duration `{value}`")]
    InvalidWait { line: usize, value: String },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("session io error: {0}")]
    Io(#[from] io::Error),
}

/// Parses one script line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<Command>, ScriptError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (command, rest) = split_word(line);

    let parsed = match command {
        "type" => {
            let (field, value) = split_word(rest);
            if field.is_empty() {
                return Err(missing(line_no, "type", "a field name"));
            }
            Command::Type {
                field: field.to_string(),
                value: value.to_string(),
            }
        }
        "check" | "uncheck" => {
            let (field, value) = split_word(rest);
            if field.is_empty() || value.is_empty() {
                let name = if command == "check" { "check" } else { "uncheck" };
                return Err(missing(line_no, name, "a field name and a value"));
            }
            let (field, value) = (field.to_string(), value.to_string());
            if command == "check" {
                Command::Check { field, value }
            } else {
                Command::Uncheck { field, value }
            }
        }
        "wait" => {
            if rest.is_empty() {
                return Err(missing(line_no, "wait", "a duration in milliseconds"));
            }
            let millis = rest.parse::<u64>().map_err(|_| ScriptError::InvalidWait {
                line: line_no,
                value: rest.to_string(),
            })?;
            Command::Wait(Duration::from_millis(millis))
        }
        "show" => Command::Show,
        "quit" => Command::Quit,
        other => {
            return Err(ScriptError::UnknownCommand {
                line: line_no,
                command: other.to_string(),
            })
        }
    };
    Ok(Some(parsed))
}

fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (text, ""),
    }
}

fn missing(line: usize, command: &'static str, expected: &'static str) -> ScriptError {
    ScriptError::MissingArgument {
        line,
        command,
        expected,
    }
}

/// Runs script commands against the page until `quit` or end of input, then
/// waits up to `settle` for outstanding work to finish.
pub async fn run<R, W>(
    input: R,
    output: &mut W,
    handle: &SearchHandle,
    settle: Duration,
) -> Result<SearchViewModel, SessionError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut line_no = 0;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let Some(command) = parse_line(line_no, &line)? else {
            continue;
        };
        search_debug!("script line {}: {:?}", line_no, command);
        match command {
            Command::Type { field, value } => handle.text_input(field, value),
            Command::Check { field, value } => handle.checkbox_clicked(field, value, true),
            Command::Uncheck { field, value } => handle.checkbox_clicked(field, value, false),
            Command::Wait(duration) => tokio::time::sleep(duration).await,
            Command::Show => show(output, handle)?,
            Command::Quit => break,
        }
    }

    if !wait_until_idle(handle, settle).await {
        search_warn!("page still busy after {:?}; exiting anyway", settle);
    }
    Ok(handle.view())
}

fn show<W: Write>(output: &mut W, handle: &SearchHandle) -> io::Result<()> {
    writeln!(output, "{}", summary_line(&handle.view()))?;
    writeln!(output, "{}", handle.page_markup())?;
    output.flush()
}

pub fn summary_line(view: &SearchViewModel) -> String {
    format!(
        "phase={:?} loading={} submissions={} applied={} fallbacks={} query={}",
        view.phase,
        view.loading,
        view.submissions,
        view.fragments_applied,
        view.fallbacks,
        view.query
    )
}

/// Nothing scheduled or in flight, on a page that is not being replaced.
fn is_idle(view: &SearchViewModel) -> bool {
    let settled = matches!(view.phase, PagePhase::Interactive | PagePhase::Stranded);
    settled && view.pending_ticket.is_none() && view.in_flight.is_empty()
}

async fn wait_until_idle(handle: &SearchHandle, limit: Duration) -> bool {
    let mut view = handle.watch_view();
    let wait = async {
        if !handle.flush().await {
            return false;
        }
        loop {
            if is_idle(&view.borrow_and_update()) {
                return true;
            }
            if view.changed().await.is_err() {
                return false;
            }
        }
    };
    tokio::time::timeout(limit, wait).await.unwrap_or(false)
}

/// Logs runtime events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::Scheduled { ticket } => search_debug!("submit scheduled ({:?})", ticket),
            RuntimeEvent::Posted {
                request_id,
                endpoint,
            } => search_info!("request {} posted to {}", request_id, endpoint),
            RuntimeEvent::FragmentApplied {
                request_id,
                status_updated,
            } => search_info!(
                "request {} applied (status updated: {})",
                request_id,
                status_updated
            ),
            RuntimeEvent::FellBack { request_id, kind } => {
                search_warn!("request {} failed ({}); submitting natively", request_id, kind)
            }
            RuntimeEvent::Navigated { url } => search_info!("page reloaded from {}", url),
            RuntimeEvent::NavigationFailed { url, kind } => {
                search_warn!("navigation to {} failed ({})", url, kind)
            }
        }
    }
}
