// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

//! The lowest layer of the control-record codec: turns a byte stream of
//! blank-line-separated RFC2822-like paragraphs into [RawParagraph]s of
//! [RawField]s, with no notion of which fields are known or what they
//! mean. [super::record] builds the typed [crate::package::Package] view
//! on top of this.

use crate::buffer::GrowableBuffer;

/// All the raw, unprocessed, stringified [RawField] values seen in one
/// paragraph, in file order.
///
/// In general, using this directly is a bit low-level; [super::record]'s
/// typed accessors are the more pleasant surface. Exported for callers
/// who need it anyway.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawParagraph {
    /// Raw series of fields, in the order they were seen.
    pub fields: Vec<RawField>,
}

/// Minimally processed key/value pair from a Debian RFC2822-style
/// document. Continuation lines have already been joined with `\n`; a
/// continuation line whose sole content is `.` decodes to an empty line
/// within the value (§4.1).
#[derive(Clone, Debug, PartialEq)]
pub struct RawField {
    /// Field name, exactly as written (case preserved; comparisons
    /// elsewhere are case-insensitive).
    pub key: String,

    /// Field value, with continuation-line indentation stripped and
    /// lone-`.` lines decoded to blank lines.
    pub value: String,
}

/// Error conditions encountered parsing a [RawParagraph].
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A non-comment, non-continuation line did not contain a `:`.
    MissingColon {
        /// 1-indexed line number.
        line: usize,
    },
    /// A continuation line (leading whitespace) appeared before any
    /// field.
    LeadingContinuation {
        /// 1-indexed line number.
        line: usize,
    },
    /// A field name was empty.
    EmptyFieldName {
        /// 1-indexed line number.
        line: usize,
    },
}

crate::errors::error_enum!(Error);

impl RawParagraph {
    /// Parse one paragraph: a run of fields with no blank line inside it.
    /// Comment lines (`#...`) are dropped. Trailing/leading blank lines
    /// around the paragraph are tolerated; a blank line *inside* is a
    /// caller error (paragraph splitting happens one level up, in
    /// [super::record]).
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut fields: Vec<RawField> = Vec::new();
        for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            if raw_line.trim().is_empty() || raw_line.starts_with('#') {
                continue;
            }

            let is_continuation = raw_line.starts_with(' ') || raw_line.starts_with('\t');
            if is_continuation {
                let Some(field) = fields.last_mut() else {
                    return Err(Error::LeadingContinuation { line: line_no });
                };
                let content = raw_line.trim_start_matches([' ', '\t']);
                if content == "." {
                    field.value.push('\n');
                } else {
                    field.value.push('\n');
                    field.value.push_str(content);
                }
                continue;
            }

            let Some(colon) = raw_line.find(':') else {
                return Err(Error::MissingColon { line: line_no });
            };
            let key = raw_line[..colon].trim().to_owned();
            if key.is_empty() {
                return Err(Error::EmptyFieldName { line: line_no });
            }
            let value = raw_line[colon + 1..].trim_start().to_owned();
            fields.push(RawField { key, value });
        }
        Ok(RawParagraph { fields })
    }

    /// Split a multi-paragraph document (paragraphs separated by one or
    /// more blank lines) and parse each one.
    pub fn parse_all(text: &str) -> Result<Vec<Self>, Error> {
        let mut paragraphs = Vec::new();
        let mut current = String::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    paragraphs.push(RawParagraph::parse(&current)?);
                    current.clear();
                }
                continue;
            }
            current.push_str(line);
            current.push('\n');
        }
        if !current.is_empty() {
            paragraphs.push(RawParagraph::parse(&current)?);
        }
        Ok(paragraphs)
    }

    /// Iterate over all fields in file order.
    pub fn iter(&self) -> impl Iterator<Item = &RawField> {
        self.fields.iter()
    }

    /// All fields with the given name, case-insensitively.
    pub fn field<'field>(
        &'field self,
        field_name: &'field str,
    ) -> impl Iterator<Item = &'field RawField> {
        self.fields
            .iter()
            .filter(move |f| f.key.eq_ignore_ascii_case(field_name))
    }

    /// Serialize back into Debian RFC2822-style text, one field per line
    /// with `\n`-joined multi-line values indented by one space;
    /// internal empty lines become a lone `.`. Terminated with a single
    /// blank line, per §4.1.
    pub fn to_text(&self) -> String {
        let mut buf = GrowableBuffer::new();
        for field in &self.fields {
            buf.append_str(&field.key);
            buf.append_str(": ");
            let mut lines = field.value.split('\n');
            if let Some(first) = lines.next() {
                buf.append_str(first);
            }
            for line in lines {
                buf.append_byte(b'\n');
                if line.is_empty() {
                    buf.append_str(" .");
                } else {
                    buf.append_byte(b' ');
                    buf.append_str(line);
                }
            }
            buf.append_byte(b'\n');
        }
        buf.append_byte(b'\n');
        buf.to_string_lossy().into_owned()
    }
}


// vim: foldmethod=marker
