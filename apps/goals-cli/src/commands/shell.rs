// shell.rs: Interactive REPL and script runner.
//
// Both feed lines to the same Session. The REPL reports errors and keeps
// going; a script stops at the first failing line.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::goal::{Flow, Session};

const PROMPT: &str = "goals> ";

/// Run the interactive shell until `quit`, Ctrl-C or Ctrl-D.
pub fn execute(session: &mut Session) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    let stdout = io::stdout();

    println!("Goals shell. Type `help` for commands, `quit` to leave.");
    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    editor.add_history_entry(line.as_str())?;
                }
                let mut out = stdout.lock();
                match session.execute_line(&line, &mut out) {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => eprintln!("error: {:#}", e),
                }
                out.flush()?;
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    tracing::debug!(goals = session.store().len(), "shell closed");
    Ok(())
}

/// Execute every line of `path`, stopping at the first error or `quit`.
pub fn run_script(session: &mut Session, path: &Path, out: &mut dyn Write) -> anyhow::Result<()> {
    let script = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;

    for (number, line) in script.lines().enumerate() {
        let flow = session
            .execute_line(line, out)
            .with_context(|| format!("{}:{}: {}", path.display(), number + 1, line.trim()))?;
        if flow == Flow::Quit {
            break;
        }
    }
    Ok(())
}
