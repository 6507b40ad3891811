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

//! The `dependency` module parses and represents the relationship clauses
//! that appear on a package's `Depends`, `Pre-Depends`, `Recommends`,
//! `Suggests`, `Enhances`, `Conflicts`, `Replaces` and `Provides` fields.
//!
//! # Overview of the model
//!
//! A [Relationship] is tagged with the [RelationKind] it was parsed from,
//! and holds a disjunction of [Possibility] values (an `OR`): any one
//! possibility being met satisfies the clause. A field's full value
//! parses into `Vec<Relationship>`, all sharing one [RelationKind] -- each
//! entry is one comma-separated clause, and *all* of them must hold (an
//! `AND` across entries).
//!
//! ```
//! use dpkg_engine::dependency::{RelationKind, Relationship};
//!
//! let rels = Relationship::parse_field(RelationKind::Depends, "foo, bar | baz").unwrap();
//! assert_eq!(2, rels.len());
//! ```
//!
//! # Note on `dpkg-substvars`
//!
//! This module does not parse values that still contain unresolved
//! `dpkg-substvars` placeholders (e.g. `${shlibs:Depends}`). Substvar
//! substitution is expected to have already happened upstream of
//! whatever hands a field value to this parser.
//!
//! # Feature `serde`
//!
//! This feature will enable derives or explicit implementations of
//! [serde::Deserialize] and [serde::Serialize] for types in this module.

mod error;
mod possibility;
mod relationship;
mod version;

pub use error::Error;
pub use possibility::Possibility;
pub use relationship::{join_field, RelationKind, Relationship};
pub use version::{VersionConstraint, VersionOperator};

// vim: foldmethod=marker
