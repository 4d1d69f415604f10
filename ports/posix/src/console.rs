//! Debug consoles for the hosted port.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use hal::console::Console;

#[derive(Clone)]
enum Sink {
    Stdout,
    Memory(Arc<Mutex<Vec<String>>>),
}

/// Console writing either to stdout, tagged with the node label, or to an
/// in-memory transcript.
#[derive(Clone)]
pub struct SimConsole {
    label: Arc<str>,
    sink: Sink,
}

impl SimConsole {
    pub fn stdout(label: &str) -> Self {
        Self {
            label: Arc::from(label),
            sink: Sink::Stdout,
        }
    }

    pub fn memory(label: &str) -> Self {
        Self {
            label: Arc::from(label),
            sink: Sink::Memory(Arc::default()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Lines written so far; always empty for stdout consoles.
    pub fn lines(&self) -> Vec<String> {
        match &self.sink {
            Sink::Stdout => Vec::new(),
            Sink::Memory(lines) => lines.lock().unwrap_or_else(PoisonError::into_inner).clone(),
        }
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines().iter().filter(|line| line.contains(needle)).count()
    }
}

impl Console for SimConsole {
    fn write_line(&self, args: fmt::Arguments<'_>) {
        match &self.sink {
            Sink::Stdout => {
                let mut out = io::stdout().lock();
                // A closed stdout only loses the line
                let _ = writeln!(out, "[{}] {}", self.label, args);
            }
            Sink::Memory(lines) => lines
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(args.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal::console_line;

    #[test]
    fn memory_console_keeps_untagged_lines() {
        let console = SimConsole::memory("node-1");
        let copy = console.clone();
        console_line!(console, "CAN-FD Frame sent with message ID-{}", 1);
        console_line!(copy, "Rx Data :");

        assert_eq!(console.lines(), vec!["CAN-FD Frame sent with message ID-1", "Rx Data :"]);
        assert_eq!(console.count_containing("ID-1"), 1);
        assert_eq!(console.label(), "node-1");
    }

    #[test]
    fn stdout_console_has_no_transcript() {
        let console = SimConsole::stdout("node-2");
        console_line!(console, "hello");
        assert!(console.lines().is_empty());
    }
}
