//! Terminal rendering surface.
//!
//! Messages and alerts are printed as they arrive. HTML fragments are kept in
//! memory only; commands print their own plain-text projections.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

use truffle_storefront::views::{MemorySurface, Region, Surface, Tone};

/// At least one error message was shown while running the command.
#[derive(Debug, Error)]
#[error("{0} error(s) reported")]
pub struct ReportedErrors(usize);

/// A [`Surface`] that prints to the terminal.
#[derive(Debug, Default)]
pub struct TerminalSurface {
    regions: MemorySurface,
    errors: AtomicUsize,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail if any error message was shown.
    pub fn flush_errors(&self) -> Result<(), ReportedErrors> {
        match self.errors.load(Ordering::Relaxed) {
            0 => Ok(()),
            n => Err(ReportedErrors(n)),
        }
    }
}

impl Surface for TerminalSurface {
    fn replace(&self, region: Region, html: String) {
        self.regions.replace(region, html);
    }

    fn message(&self, region: Region, tone: Tone, text: &str) {
        self.regions.message(region, tone, text);
        if text.is_empty() {
            return;
        }
        match tone {
            Tone::Error => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                eprintln!("error: {text}");
            }
            Tone::Info | Tone::Success => println!("{text}"),
        }
    }

    fn alert(&self, text: &str) {
        self.regions.alert(text);
        println!("{text}");
    }
}
