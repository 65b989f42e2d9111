//! JUnit XML detection.
//!
//! A report is accepted when its token stream is well formed, its character
//! data is valid UTF-8 made of legal XML characters, and it contains at least
//! one element whose local name is `testsuite`. No schema is applied.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::error::{Result, TestNodError};

const TESTSUITE: &[u8] = b"testsuite";

/// Check that the file at `path` looks like a JUnit XML report
pub fn validate_junit_xml(path: &Path) -> Result<()> {
    let file = File::open(path).map_err(|source| TestNodError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;

    let testsuites = scan_testsuites(BufReader::new(file))?;
    debug!(path = %path.display(), testsuites, "scanned XML file");

    if testsuites == 0 {
        return Err(TestNodError::NotJUnit {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Count `testsuite` elements, scanning the whole document
fn scan_testsuites<R: BufRead>(source: R) -> Result<usize> {
    let mut reader = Reader::from_reader(source);
    let mut buf = Vec::new();
    let mut depth: usize = 0;
    let mut testsuites = 0;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| TestNodError::MalformedXml {
                position: reader.buffer_position() as u64,
                details: e.to_string(),
            })?;

        let checked = match &event {
            Event::Start(start) => {
                depth += 1;
                if is_testsuite(start) {
                    testsuites += 1;
                }
                check_attributes(start)
            }
            Event::Empty(start) => {
                if is_testsuite(start) {
                    testsuites += 1;
                }
                check_attributes(start)
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                Ok(())
            }
            Event::Text(text) => check_chars(text),
            Event::CData(cdata) => check_chars(cdata),
            Event::Eof => break,
            _ => Ok(()),
        };

        if let Err(details) = checked {
            return Err(TestNodError::MalformedXml {
                position: reader.buffer_position() as u64,
                details,
            });
        }
        buf.clear();
    }

    if depth > 0 {
        return Err(TestNodError::MalformedXml {
            position: reader.buffer_position() as u64,
            details: format!("unexpected end of file with {depth} unclosed element(s)"),
        });
    }

    Ok(testsuites)
}

fn is_testsuite(start: &BytesStart<'_>) -> bool {
    start.local_name().as_ref() == TESTSUITE
}

fn check_attributes(start: &BytesStart<'_>) -> std::result::Result<(), String> {
    let mut attributes = start.attributes();
    attributes.with_checks(false);

    for attribute in attributes {
        let attribute = attribute.map_err(|e| e.to_string())?;
        check_chars(&attribute.value)?;
    }
    Ok(())
}

/// Character data must be UTF-8 made only of XML `Char`s
fn check_chars(bytes: &[u8]) -> std::result::Result<(), String> {
    let text = std::str::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {e}"))?;

    match text.chars().find(|&c| !is_xml_char(c)) {
        Some(c) => Err(format!("illegal character code U+{:04X}", c as u32)),
        None => Ok(()),
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}
