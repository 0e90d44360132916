//! Terminal interaction (line input, clipboard).

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::debug;

use super::RealRuntime;

use std::io::{self, BufRead, IsTerminal, Write};

/// Core, testable implementation that reads from any BufRead and writes to any Write.
pub(crate) fn read_line_with_io<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> Result<Option<String>> {
    write!(output, "{}", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }

    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Writes an OSC 52 "set clipboard" sequence. Most terminal emulators (and tmux
/// with `set-clipboard on`) forward it to the system clipboard.
pub(crate) fn write_osc52<W: Write>(text: &str, output: &mut W) -> Result<()> {
    write!(output, "\x1b]52;c;{}\x07", STANDARD.encode(text))?;
    output.flush()?;
    Ok(())
}

impl RealRuntime {
    pub(crate) fn read_line_impl(&self, prompt: &str) -> Result<Option<String>> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut stdin_lock = stdin.lock();
        read_line_with_io(prompt, &mut stdin_lock, &mut stdout)
    }

    pub(crate) fn set_clipboard_impl(&self, text: &str) -> Result<bool> {
        let mut stdout = io::stdout();
        if !stdout.is_terminal() {
            debug!("stdout is not a terminal, skipping clipboard");
            return Ok(false);
        }
        write_osc52(text, &mut stdout)?;
        Ok(true)
    }
}
