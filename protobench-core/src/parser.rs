//! Tolerant NDJSON decoding of load-test output.
//!
//! Every non-blank line is decoded independently. Lines that are not valid
//! JSON are skipped and counted; only the first few are logged so that a
//! systematically corrupt file does not flood the output.

use std::io::{self, BufRead};

use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::event::Event;

/// How many malformed lines are logged per source before going quiet.
pub const DEFAULT_MALFORMED_LOG_LIMIT: usize = 10;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Lines decoded into an event.
    pub decoded: usize,
    /// Non-blank lines that failed to decode.
    pub malformed: usize,
    /// Blank lines skipped.
    pub blank: usize,
}

#[derive(Debug)]
struct LineDecoder {
    source: String,
    log_limit: usize,
    stats: ParseStats,
}

impl LineDecoder {
    fn new(source: impl Into<String>, log_limit: usize) -> Self {
        Self {
            source: source.into(),
            log_limit,
            stats: ParseStats::default(),
        }
    }

    fn decode(&mut self, line_no: usize, line: &str) -> Option<Event> {
        let line = line.trim();
        if line.is_empty() {
            self.stats.blank += 1;
            return None;
        }

        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(record) => {
                self.stats.decoded += 1;
                Some(Event::from_value(&record))
            }
            Err(err) => {
                self.malformed(line_no, &err);
                None
            }
        }
    }

    fn malformed(&mut self, line_no: usize, err: &dyn std::fmt::Display) {
        self.stats.malformed += 1;
        if self.stats.malformed <= self.log_limit {
            warn!(
                source = %self.source,
                line = line_no,
                error = %err,
                "skipping malformed record"
            );
        } else if self.stats.malformed == self.log_limit + 1 {
            warn!(
                source = %self.source,
                "too many malformed records; further ones are not logged"
            );
        }
    }
}

/// Lazy event stream over a buffered reader.
///
/// The stream cannot be rewound; re-open the source to read it again. A
/// line that is not valid UTF-8 counts as malformed. Any other I/O error
/// ends the stream and is reported by [`EventReader::finish`].
#[derive(Debug)]
pub struct EventReader<R> {
    lines: io::Lines<R>,
    line_no: usize,
    decoder: LineDecoder,
    io_error: Option<io::Error>,
}

impl<R: BufRead> EventReader<R> {
    pub fn new(reader: R, source: impl Into<String>) -> Self {
        Self::with_log_limit(reader, source, DEFAULT_MALFORMED_LOG_LIMIT)
    }

    pub fn with_log_limit(reader: R, source: impl Into<String>, log_limit: usize) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            decoder: LineDecoder::new(source, log_limit),
            io_error: None,
        }
    }

    /// Counters so far.
    pub fn stats(&self) -> ParseStats {
        self.decoder.stats
    }

    /// Returns the final counters, or the I/O error that cut the stream short.
    pub fn finish(self) -> Result<ParseStats> {
        match self.io_error {
            Some(err) => Err(err.into()),
            None => Ok(self.decoder.stats),
        }
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = Event;

    fn next(&mut self) -> Option<Self::Item> {
        if self.io_error.is_some() {
            return None;
        }

        loop {
            let line = self.lines.next()?;
            self.line_no += 1;

            match line {
                Ok(line) => {
                    if let Some(event) = self.decoder.decode(self.line_no, &line) {
                        return Some(event);
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                    self.decoder.malformed(self.line_no, &err);
                }
                Err(err) => {
                    self.io_error = Some(err);
                    return None;
                }
            }
        }
    }
}

/// Decodes in-memory lines.
pub fn parse_lines<I, S>(lines: I, source: &str, log_limit: usize) -> (Vec<Event>, ParseStats)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut decoder = LineDecoder::new(source, log_limit);
    let events = lines
        .into_iter()
        .enumerate()
        .filter_map(|(idx, line)| decoder.decode(idx + 1, line.as_ref()))
        .collect();
    (events, decoder.stats)
}

/// Decodes a whole file's contents.
pub fn parse_str(text: &str, source: &str, log_limit: usize) -> (Vec<Event>, ParseStats) {
    parse_lines(text.lines(), source, log_limit)
}
