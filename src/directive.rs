//! The `#FILENAME:` directive protocol.
//!
//! A rendered template is one text blob. Any line containing the marker
//! `#FILENAME:` starts a new output segment:
//!
//! ```text
//! #FILENAME:<filename>[:<mode>[:<permissions>]]
//! ```
//!
//! Lines before the first directive belong to a segment named after the
//! template itself. Directive lines never reach file content. Segments in
//! `skip` mode, and segments holding only blank lines, are dropped.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::types::{DEFAULT_PERMISSIONS, FileMode, GeneratedFile};

/// Marker that opens a new file segment
pub const FILENAME_MARKER: &str = "#FILENAME:";

static MODE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(merge|create-only|write-always|skip)\b").expect("mode token pattern is valid")
});

/// Name, mode and permissions of the segment being accumulated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHeader {
    pub filename: String,
    pub mode: FileMode,
    pub permissions: String,
}

impl SegmentHeader {
    pub fn new<S: Into<String>>(filename: S) -> Self {
        Self {
            filename: filename.into(),
            mode: FileMode::WriteAlways,
            permissions: DEFAULT_PERMISSIONS.to_string(),
        }
    }
}

/// Classification of a single rendered line
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Content(&'a str),
    Directive(SegmentHeader),
    Malformed,
}

fn classify(line: &str) -> Line<'_> {
    let Some(index) = line.find(FILENAME_MARKER) else {
        return Line::Content(line);
    };

    let rest = &line[index + FILENAME_MARKER.len()..];
    let rest = rest.split(FILENAME_MARKER).next().unwrap_or_default();

    let mut fields = rest.split(':');
    let filename = fields.next().unwrap_or_default().trim();
    if filename.is_empty() {
        return Line::Malformed;
    }

    let mode = fields
        .next()
        .and_then(|token| MODE_TOKEN.captures(token))
        .and_then(|captures| captures[1].parse().ok())
        .unwrap_or_default();

    let permissions = fields
        .next()
        .and_then(|token| token.split_whitespace().next())
        .unwrap_or(DEFAULT_PERMISSIONS)
        .to_string();

    Line::Directive(SegmentHeader {
        filename: filename.to_string(),
        mode,
        permissions,
    })
}

/// Accumulates lines into the current segment and flushes on every directive
struct FileSplitter<'a> {
    header: SegmentHeader,
    lines: Vec<&'a str>,
    files: Vec<GeneratedFile>,
}

impl<'a> FileSplitter<'a> {
    fn new(default_filename: &str) -> Self {
        Self {
            header: SegmentHeader::new(default_filename),
            lines: Vec::new(),
            files: Vec::new(),
        }
    }

    fn feed(&mut self, line: &'a str) {
        match classify(line) {
            Line::Content(content) => self.lines.push(content),
            Line::Directive(header) => {
                self.flush();
                self.header = header;
            }
            Line::Malformed => {
                warn!(line = %line, "Invalid file header format, ignoring directive");
            }
        }
    }

    fn flush(&mut self) {
        let lines = std::mem::take(&mut self.lines);

        if self.header.mode == FileMode::Skip {
            debug!(filename = %self.header.filename, "Skipping segment marked skip");
            return;
        }

        if lines.iter().all(|line| line.trim().is_empty()) {
            debug!(filename = %self.header.filename, "Skipping empty segment");
            return;
        }

        self.files.push(GeneratedFile {
            filename: self.header.filename.clone(),
            content: lines.join("\n"),
            mode: self.header.mode,
            permissions: self.header.permissions.clone(),
        });
    }

    fn finish(mut self) -> Vec<GeneratedFile> {
        self.flush();
        self.files
    }
}

/// Split one rendered blob into its file segments, in order.
///
/// `default_filename` names the segment preceding the first directive.
pub fn split_files(default_filename: &str, source: &str) -> Vec<GeneratedFile> {
    let mut splitter = FileSplitter::new(default_filename);
    for line in source.split('\n') {
        splitter.feed(line);
    }
    splitter.finish()
}
