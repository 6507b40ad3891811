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

//! The control-record codec: paragraph-structured, field-oriented text
//! records, as used by the `status`/`available` database files and by
//! the `info/<name>.*` per-package metadata.
//!
//! [raw] is the untyped layer (paragraphs of string fields, no notion of
//! which fields are known); [record] builds the typed
//! [crate::package::Package] view on top, applying the fixed field
//! registry, alias table, and applicability predicates from the field
//! catalog.

pub mod raw;
pub mod record;

pub use raw::{RawField, RawParagraph};
pub use record::{decode_paragraph, encode_paragraph, DecodeMode, Error, Warning};

// vim: foldmethod=marker
