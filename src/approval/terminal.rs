// ABOUTME: Interactive approval over a terminal.
// ABOUTME: Prompts on stderr and reads a y/N answer line from stdin or any async reader.

use async_trait::async_trait;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use super::{ApprovalChannel, ApprovalDecision, ApprovalRequest};

/// Asks the operator at the terminal.
///
/// `y` or `yes` approves; any other answer denies. End of input cancels, as
/// does a read error.
pub struct TerminalApproval<R> {
    input: Mutex<Lines<BufReader<R>>>,
}

impl TerminalApproval<Stdin> {
    pub fn stdin() -> Self {
        Self::from_reader(tokio::io::stdin())
    }
}

impl<R: AsyncRead + Unpin + Send> TerminalApproval<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            input: Mutex::new(BufReader::new(reader).lines()),
        }
    }
}

fn parse_answer(line: &str) -> ApprovalDecision {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => ApprovalDecision::Approved,
        _ => ApprovalDecision::Denied,
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> ApprovalChannel for TerminalApproval<R> {
    async fn decide(&self, request: &ApprovalRequest) -> ApprovalDecision {
        {
            let mut stderr = std::io::stderr().lock();
            let _ = write!(stderr, "{} [y/N] ", request.prompt());
            let _ = stderr.flush();
        }

        let mut input = self.input.lock().await;
        match input.next_line().await {
            Ok(Some(line)) => parse_answer(&line),
            Ok(None) => {
                tracing::warn!(gate = %request.gate, "input closed while waiting for approval");
                ApprovalDecision::Cancelled
            }
            Err(e) => {
                tracing::warn!(gate = %request.gate, "failed to read approval answer: {}", e);
                ApprovalDecision::Cancelled
            }
        }
    }
}
