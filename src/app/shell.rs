use crate::app::session::{parse_command, InvoiceSession, Reply, HELP_TEXT};
use crate::core::runner::Completion;
use crate::domain::ports::DocumentCompiler;
use crate::utils::error::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

const PROMPT: &str = "invoice> ";

/// Interactive loop on stdin/stdout.
pub async fn run_shell<C: DocumentCompiler + 'static>(
    session: InvoiceSession<C>,
    completions: UnboundedReceiver<Completion>,
) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_loop(session, completions, stdin, &mut stdout).await
}

/// Reads commands from `input` and applies worker completions as they arrive. Both happen on
/// this task, so the session is never shared with a worker.
pub async fn run_loop<C, R, W>(
    mut session: InvoiceSession<C>,
    mut completions: UnboundedReceiver<Completion>,
    input: R,
    out: &mut W,
) -> Result<()>
where
    C: DocumentCompiler + 'static,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    writeln!(out, "{}", HELP_TEXT)?;

    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    writeln!(out)?;
                    break;
                };
                let command = match parse_command(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        writeln!(out, "{}", e.user_friendly_message())?;
                        continue;
                    }
                };
                match session.execute(command) {
                    Ok(Reply::Text(text)) => writeln!(out, "{}", text)?,
                    Ok(Reply::Started(ticket)) => {
                        writeln!(out, "Generating invoice {} in the background...", ticket)?
                    }
                    Ok(Reply::Quit) => break,
                    Err(e) => {
                        tracing::debug!("Command failed: {}", e);
                        writeln!(out, "{}", e.user_friendly_message())?;
                    }
                }
            }
            Some(completion) = completions.recv() => {
                writeln!(out)?;
                writeln!(out, "{}", session.apply_completion(completion))?;
            }
        }
    }

    if session.is_busy() {
        writeln!(out, "Waiting for the running invoice to finish...")?;
        if let Some(completion) = completions.recv().await {
            writeln!(out, "{}", session.apply_completion(completion))?;
        }
    }
    Ok(())
}
