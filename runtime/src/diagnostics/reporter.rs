// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{
    fmt::{Arguments, Display, Write},
    panic::Location,
};

use arrayvec::ArrayString;
use enum_map::{Enum, EnumMap};

use crate::{
    allocators::Allocator,
    collections::{Iter, LinkedList},
};

/// Messages longer than this are truncated.
pub const REPORT_MESSAGE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Enum)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
}

impl Severity {
    /// The one-letter tag shown in front of reports.
    pub const fn letter(self) -> char {
        match self {
            Severity::Trace => 'T',
            Severity::Debug => 'D',
            Severity::Info => 'I',
            Severity::Warning => 'W',
            Severity::Error => 'E',
        }
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub severity: Severity,
    pub message: ArrayString<REPORT_MESSAGE_CAPACITY>,
    /// How many times this report was made in a row.
    pub count: u32,
    pub location: &'static Location<'static>,
}

impl Display for Report {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.severity.letter(), self.message)?;
        if self.count > 1 {
            write!(f, " x{}", self.count)?;
        }
        Ok(())
    }
}

/// A log of messages for showing in a developer console. Repeats of the most
/// recent report are folded into it.
pub struct Reporter<A: Allocator> {
    reports: LinkedList<Report, A>,
    counts: EnumMap<Severity, u32>,
}

impl<A: Allocator> Reporter<A> {
    pub fn new(allocator: A) -> Reporter<A> {
        Reporter {
            reports: LinkedList::new(allocator),
            counts: EnumMap::default(),
        }
    }

    /// Adds a report, or bumps the count of the latest report if it has the
    /// same severity and message. Returns false if there was no memory left
    /// for a new report (it's still counted in [`Reporter::counts`]).
    #[track_caller]
    pub fn report(&mut self, severity: Severity, message: Arguments) -> bool {
        self.counts[severity] += 1;

        let mut truncated = TruncatingWriter(ArrayString::new());
        let _ = truncated.write_fmt(message);
        let message = truncated.0;

        if let Some(latest) = self.reports.back_mut() {
            if latest.severity == severity && latest.message == message {
                latest.count += 1;
                return true;
            }
        }

        self.reports
            .push_back(Report {
                severity,
                message,
                count: 1,
                location: Location::caller(),
            })
            .is_ok()
    }

    /// The reports, oldest first.
    pub fn reports(&self) -> Iter<'_, Report> {
        self.reports.iter()
    }

    /// The amount of distinct reports kept.
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// How many reports of each severity have been made, repeats included.
    pub fn counts(&self) -> &EnumMap<Severity, u32> {
        &self.counts
    }

    pub fn clear(&mut self) {
        self.reports.clear();
        self.counts = EnumMap::default();
    }
}

struct TruncatingWriter(ArrayString<REPORT_MESSAGE_CAPACITY>);

impl Write for TruncatingWriter {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for c in s.chars() {
            if self.0.try_push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::{format, string::String};

    use crate::{
        allocators::{BasicAllocator, FixedArena},
        test_platform::TestPlatform,
    };

    use super::{Reporter, Severity, REPORT_MESSAGE_CAPACITY};

    #[test]
    fn repeats_are_folded() {
        let platform = TestPlatform::new();
        let mut reporter = Reporter::new(BasicAllocator::new(&platform));
        for _ in 0..3 {
            assert!(reporter.report(Severity::Info, format_args!("reloaded {}", "atlas.bmp")));
        }
        reporter.report(Severity::Error, format_args!("reloaded atlas.bmp"));
        reporter.report(Severity::Info, format_args!("reloaded atlas.bmp"));

        let lines = reporter.reports().map(|report| format!("{report}"));
        assert!(lines.eq([
            "I: reloaded atlas.bmp x3",
            "E: reloaded atlas.bmp",
            "I: reloaded atlas.bmp",
        ]));
        assert_eq!(4, reporter.counts()[Severity::Info]);
        assert_eq!(1, reporter.counts()[Severity::Error]);
        assert_eq!(0, reporter.counts()[Severity::Trace]);

        reporter.clear();
        assert!(reporter.is_empty());
        assert_eq!(0, reporter.counts()[Severity::Info]);
    }

    #[test]
    fn long_messages_are_truncated() {
        let platform = TestPlatform::new();
        let arena = FixedArena::new(BasicAllocator::new(&platform), 4096).unwrap();
        let mut reporter = Reporter::new(&arena);
        let long: String = "x".repeat(REPORT_MESSAGE_CAPACITY + 10);
        reporter.report(Severity::Warning, format_args!("{long}"));
        let report = reporter.reports().next().unwrap();
        assert_eq!(REPORT_MESSAGE_CAPACITY, report.message.len());
        assert_eq!(file!(), report.location.file());
    }

    #[test]
    fn full_allocator_still_counts() {
        let platform = TestPlatform::new();
        let arena = FixedArena::new(BasicAllocator::new(&platform), 8).unwrap();
        let mut reporter = Reporter::new(&arena);
        assert!(!reporter.report(Severity::Debug, format_args!("no room")));
        assert_eq!(1, reporter.counts()[Severity::Debug]);
        assert_eq!(0, reporter.len());
    }
}
