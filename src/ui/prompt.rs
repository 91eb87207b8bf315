use std::io::{self, BufRead, Write};

// ---------------------------------------------------------------------------
// Confirm – yes/no question before saving
// ---------------------------------------------------------------------------

/// Asks the user whether to go ahead. `false` means "no" or dismissed.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;

    /// Whether answering needs a graphical display.
    fn requires_display(&self) -> bool {
        false
    }
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Native yes/no message box.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialogConfirm;

impl Confirm for DialogConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        let answer = rfd::MessageDialog::new()
            .set_title("fcs-ridge")
            .set_description(prompt)
            .set_level(rfd::MessageLevel::Info)
            .set_buttons(rfd::MessageButtons::YesNo)
            .show();
        answer == rfd::MessageDialogResult::Yes
    }

    fn requires_display(&self) -> bool {
        true
    }
}

/// `[y/N]` question on a text stream.
pub struct TerminalConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl TerminalConfirm<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Confirm for TerminalConfirm<R, W> {
    fn confirm(&mut self, prompt: &str) -> bool {
        if write!(self.output, "{prompt} [y/N] ")
            .and_then(|_| self.output.flush())
            .is_err()
        {
            return false;
        }
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_yes(&line),
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
