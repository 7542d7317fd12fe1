use std::io::Write;

use events::{Observer, ZsyncEvent};

/// Renders lifecycle events as single-line progress on a writer.
///
/// Silent when `quiet` is set; write failures are swallowed since a
/// progress observer must never be able to fail the run.
pub struct TerminalProgress {
    out: Box<dyn Write + Send>,
    quiet: bool,
}

impl TerminalProgress {
    /// Builds a progress renderer writing to `out`.
    pub fn new(out: Box<dyn Write + Send>, quiet: bool) -> Self {
        Self { out, quiet }
    }
}

impl Observer for TerminalProgress {
    fn on_event(&mut self, event: &ZsyncEvent) {
        if self.quiet {
            return;
        }

        let line = match event {
            ZsyncEvent::Started { output } => format!("reconstructing {}", output.display()),
            ZsyncEvent::SeedStarted { seed } => format!("scanning seed {seed}"),
            ZsyncEvent::SeedFinished { seed, .. } => format!("finished seed {seed}"),
            ZsyncEvent::BlockMatched { block } => format!("matched block {block}"),
            ZsyncEvent::RangeReceived { lo, hi } => format!("need range {lo}-{hi}"),
            ZsyncEvent::Completed { output } => format!("wrote {}", output.display()),
            ZsyncEvent::Failed { reason } => format!("failed: {reason}"),
        };
        let _ = writeln!(self.out, "zsync: {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_progress_writes_nothing() {
        let mut buf = Vec::new();
        {
            let mut progress = TerminalProgress::new(Box::new(&mut buf), true);
            progress.on_event(&ZsyncEvent::Completed {
                output: "out.bin".into(),
            });
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn progress_renders_completion_line() {
        let mut buf = Vec::new();
        {
            let mut progress = TerminalProgress::new(Box::new(&mut buf), false);
            progress.on_event(&ZsyncEvent::Completed {
                output: "out.bin".into(),
            });
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("wrote out.bin"));
    }
}
