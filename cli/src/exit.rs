use std::fmt;
use std::io::Write;

use crate::error::TransportError;
use crate::http_client::TransportResult;
use crate::response::{self, ResponseMap};

/// Process exit codes shared by every subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    EncodingFailure,
    ApplicationError,
    TransportFailure,
    NotFound,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::EncodingFailure => 1,
            ExitCode::ApplicationError => 3,
            ExitCode::TransportFailure => 4,
            ExitCode::NotFound => 5,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitCode::Success => "success",
            ExitCode::EncodingFailure => "request encoding failure",
            ExitCode::ApplicationError => "application error",
            ExitCode::TransportFailure => "transport failure",
            ExitCode::NotFound => "not found",
        };
        f.write_str(s)
    }
}

/// Classifies a completed exchange. An empty 404 is "not found" regardless of
/// `parsed`; otherwise an `error` key is the only failure signal.
pub fn decide(status: u16, raw_body: &str, parsed: &ResponseMap) -> ExitCode {
    if raw_body.is_empty() && status == 404 {
        return ExitCode::NotFound;
    }
    if parsed.contains_key("error") {
        return ExitCode::ApplicationError;
    }
    ExitCode::Success
}

/// Prints the outcome of a POST to `out` and returns the exit code for it.
pub fn respond<W: Write>(
    out: &mut W,
    result: Result<TransportResult, TransportError>,
    not_found_message: &str,
) -> std::io::Result<ExitCode> {
    let result = match result {
        Ok(r) => r,
        Err(e) => {
            let err = anyhow::Error::from(e);
            tracing::warn!(error = %format!("{:#}", err), "transport failure");
            writeln!(out, "\nHTTP request failed: {:#}", err)?;
            return Ok(ExitCode::TransportFailure);
        }
    };

    let body = result.body_str();
    let parsed = response::parse(&result.body);
    let code = decide(result.status, &body, &parsed);

    if code == ExitCode::NotFound {
        writeln!(out, "\n{}\n", not_found_message)?;
    } else {
        writeln!(out, "\n{}\n", body)?;
    }
    tracing::debug!(status = result.status, exit = code.code(), outcome = %code, "response handled");
    Ok(code)
}
