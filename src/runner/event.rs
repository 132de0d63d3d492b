//! Run lifecycle events
//!
//! The runner narrates a run as a stream of events; sinks turn that
//! stream into output. The human sink prints a progress line per test,
//! the machine sink a timestamped record per event for log scraping.

use std::fmt;
use std::io::Write;

use chrono::Local;
use colored::Colorize;

use crate::common::{Error, Result};
use crate::suite::ROOT_SUITE;

/// One step in the lifecycle of a test or suite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Begin,
    Setup,
    Command,
    Teardown,
    Success,
    Failure,
    End,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Event::Begin => "begin",
            Event::Setup => "setup",
            Event::Command => "command",
            Event::Teardown => "teardown",
            Event::Success => "success",
            Event::Failure => "failure",
            Event::End => "end",
        };
        f.write_str(name)
    }
}

/// What emitted an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source<'a> {
    Test { name: &'a str, brief: &'a str },
    Suite { name: &'a str, brief: &'a str },
}

impl Source<'_> {
    pub fn name(&self) -> &str {
        match self {
            Source::Test { name, .. } | Source::Suite { name, .. } => name,
        }
    }

    pub fn brief(&self) -> &str {
        match self {
            Source::Test { brief, .. } | Source::Suite { brief, .. } => brief,
        }
    }
}

/// Consumer of run lifecycle events
pub trait EventSink {
    fn handle(&mut self, source: Source<'_>, event: Event, data: Option<&str>);
}

/// Output format selection for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFormat {
    Human,
    Machine,
}

impl EventFormat {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "human" => Ok(EventFormat::Human),
            "machine" => Ok(EventFormat::Machine),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn into_sink(self) -> Box<dyn EventSink> {
        match self {
            EventFormat::Human => Box::new(HumanSink::stdout()),
            EventFormat::Machine => Box::new(MachineSink::stdout()),
        }
    }
}

/// One progress line per test, coloured verdict per outcome
pub struct HumanSink<W: Write> {
    out: W,
}

impl HumanSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> HumanSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> EventSink for HumanSink<W> {
    fn handle(&mut self, source: Source<'_>, event: Event, _data: Option<&str>) {
        let line = match (source, event) {
            (Source::Test { brief, .. }, Event::Begin) => {
                Some(format!("{:<48} ", format!("{brief}...")))
            }
            (Source::Test { .. }, Event::Success) => Some(format!("[{}]", "PASSED".green())),
            (Source::Test { .. }, Event::Failure) => Some(format!("[{}]", "FAILED".red())),
            (Source::Test { .. }, Event::End) => Some("\n".to_string()),
            // The root suite wraps the whole selection; no verdict line
            (Source::Suite { name, brief }, Event::Success) if name != ROOT_SUITE => {
                Some(format!(
                    "{:<48} [{}]\n",
                    format!("{brief}..."),
                    "PASSED".green()
                ))
            }
            (Source::Suite { name, brief }, Event::Failure) if name != ROOT_SUITE => {
                Some(format!(
                    "{:<48} [{}]\n",
                    format!("{brief}..."),
                    "FAILED".red()
                ))
            }
            _ => None,
        };

        if let Some(line) = line {
            let _ = self.out.write_all(line.as_bytes());
            let _ = self.out.flush();
        }
    }
}

/// One timestamped record per event
pub struct MachineSink<W: Write> {
    out: W,
}

impl MachineSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> MachineSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> EventSink for MachineSink<W> {
    fn handle(&mut self, source: Source<'_>, event: Event, data: Option<&str>) {
        let timestamp = Local::now().to_rfc3339();
        let extra = match event {
            Event::Begin => Some(source.brief()).filter(|b| !b.is_empty()),
            _ => data,
        };
        let line = match extra {
            Some(extra) => format!("{}: {}: {}: {}\n", timestamp, source.name(), event, extra),
            None => format!("{}: {}: {}\n", timestamp, source.name(), event),
        };
        let _ = self.out.write_all(line.as_bytes());
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn human_output<F: FnOnce(&mut HumanSink<&mut Vec<u8>>)>(f: F) -> String {
        let mut buf = Vec::new();
        let mut sink = HumanSink::new(&mut buf);
        f(&mut sink);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(EventFormat::parse("human").unwrap(), EventFormat::Human);
        assert_eq!(EventFormat::parse("machine").unwrap(), EventFormat::Machine);
        assert!(matches!(
            EventFormat::parse("json"),
            Err(Error::UnsupportedFormat(ref f)) if f == "json"
        ));
    }

    fn test_source<'a>() -> Source<'a> {
        Source::Test {
            name: "boot",
            brief: "Boots the board",
        }
    }

    #[test]
    fn test_human_sink_renders_test_progress() {
        colored::control::set_override(false);
        let output = human_output(|sink| {
            sink.handle(test_source(), Event::Begin, None);
            sink.handle(test_source(), Event::Command, Some("reboot"));
            sink.handle(test_source(), Event::Success, None);
            sink.handle(test_source(), Event::End, None);
        });
        assert_eq!(output, format!("{:<48} [PASSED]\n", "Boots the board..."));
    }

    #[test]
    fn test_human_sink_reports_suite_verdicts_but_not_root() {
        colored::control::set_override(false);
        let output = human_output(|sink| {
            sink.handle(
                Source::Suite {
                    name: "smoke",
                    brief: "Smoke tests",
                },
                Event::Failure,
                None,
            );
            sink.handle(
                Source::Suite {
                    name: ROOT_SUITE,
                    brief: "",
                },
                Event::Failure,
                None,
            );
        });
        assert_eq!(output, format!("{:<48} [FAILED]\n", "Smoke tests..."));
    }

    #[test]
    fn test_machine_sink_records_every_event() {
        let mut buf = Vec::new();
        {
            let mut sink = MachineSink::new(&mut buf);
            sink.handle(test_source(), Event::Begin, None);
            sink.handle(test_source(), Event::Command, Some("reboot"));
            sink.handle(test_source(), Event::End, None);
        }
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(": boot: begin: Boots the board"));
        assert!(lines[1].ends_with(": boot: command: reboot"));
        assert!(lines[2].ends_with(": boot: end"));
    }
}
