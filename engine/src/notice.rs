//! User facing progress lines emitted by the runner.
//!
//! Notices are separate from the `log` output: they are the only record of
//! per-entry outcomes, so they are always written, regardless of `RUST_LOG`.

use std::{
    fmt,
    io::{self, Write},
    path::PathBuf,
    time::Duration,
};

use log::warn;

use crate::runner::RunSummary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    RunStarted { label: String, entries: usize },
    EntryStarted { id: String },
    Saved { id: String, path: PathBuf },
    NoImage { id: String },
    Failed { id: String, reason: String },
    Waiting { interval: Duration },
    Finished(RunSummary),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::RunStarted { label, entries } => {
                write!(f, "🚀 Starting {label} ({entries} prompts)...")
            }
            Notice::EntryStarted { id } => write!(f, "🎨 Generating: {id}"),
            Notice::Saved { path, .. } => write!(f, "✅ Saved: {}", path.display()),
            Notice::NoImage { .. } => write!(f, "❌ No image"),
            Notice::Failed { reason, .. } => write!(f, "❌ Error: {reason}"),
            Notice::Waiting { interval } => write!(f, "⏳ Waiting {}s...", interval.as_secs()),
            Notice::Finished(summary) => write!(
                f,
                "🏁 Done! {} saved, {} without image, {} failed",
                summary.saved(),
                summary.empty(),
                summary.failed()
            ),
        }
    }
}

pub trait NoticeSink {
    fn record(&mut self, notice: Notice);
}

/// Prints every notice as its own line and flushes right away.
#[derive(Debug, Default)]
pub struct StdoutNotices;

impl NoticeSink for StdoutNotices {
    fn record(&mut self, notice: Notice) {
        let mut out = io::stdout().lock();
        let spacer = match notice {
            Notice::EntryStarted { .. } | Notice::Finished(_) => "\n",
            _ => "",
        };
        let res = writeln!(out, "{spacer}{notice}").and_then(|_| out.flush());

        if let Err(e) = res {
            warn!("Couldn't write notice to stdout: {e}");
        }
    }
}

/// Keeps every notice in memory.
#[derive(Debug, Default, Clone)]
pub struct NoticeLog {
    pub notices: Vec<Notice>,
}

impl NoticeLog {
    pub fn lines(&self) -> Vec<String> {
        self.notices.iter().map(ToString::to_string).collect()
    }
}

impl NoticeSink for NoticeLog {
    fn record(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
