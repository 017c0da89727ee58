//! Line-oriented console front end: one triage session at a time.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::service::TriageService;
use crate::triage::{SessionStore, TriageError, TriageOutcome};

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Triage error: {0}")]
    Triage(#[from] TriageError),
}

const PROMPT: &str = "you> ";

fn print_banner<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{} triage v{}", crate::config::APP_NAME, crate::config::APP_VERSION)?;
    writeln!(out, "════════════════════════════════════════")?;
    writeln!(out, "Commands: /new (restart), /quit (exit)")?;
    writeln!(out, "════════════════════════════════════════")?;
    Ok(())
}

/// Run the dialogue loop until `/quit` or end of input.
pub fn run<S, R, W>(service: &TriageService<S>, input: R, out: &mut W) -> Result<(), ConsoleError>
where
    S: SessionStore,
    R: BufRead,
    W: Write,
{
    print_banner(out)?;

    let start = service.start_session()?;
    let mut session_id = start.context.session_id;
    writeln!(out, "\n{}\n", start.greeting)?;

    let mut lines = input.lines();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/new" => {
                let start = service.start_session()?;
                session_id = start.context.session_id;
                writeln!(out, "\n{}\n", start.greeting)?;
            }
            text => {
                let outcome = service.handle_message(&session_id, text)?;
                writeln!(out, "\n{}\n", outcome.message())?;
                if let TriageOutcome::Reply(reply) = &outcome {
                    if reply.is_complete {
                        writeln!(out, "(session complete, type /new to start again)")?;
                    }
                }
            }
        }
    }

    tracing::info!("Console session ended");
    Ok(())
}
