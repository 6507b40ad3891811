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

use super::{Error, Possibility};
use std::str::FromStr;

/// The field a [Relationship] was parsed from, which also determines how
/// the [crate::resolver] module interprets it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// `Pre-Depends`: must be unpacked *and* configured before this package
    /// unpacks.
    PreDepends,

    /// `Depends`: must be unpacked before this package configures.
    Depends,

    /// `Recommends`: installed by default, but not fatal if absent.
    Recommends,

    /// `Suggests`: advisory only.
    Suggests,

    /// `Enhances`: the inverse of `Suggests` -- this package enhances the
    /// target, rather than the other way around.
    Enhances,

    /// `Conflicts`: this package and the target may not be unpacked at
    /// the same time.
    Conflicts,

    /// `Replaces`: this package may take ownership of files, or remove,
    /// the target package.
    Replaces,

    /// `Provides`: this package satisfies unversioned [Relationship]s on
    /// the named virtual package.
    Provides,
}

impl RelationKind {
    /// Canonical field name this [RelationKind] is serialized under.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::PreDepends => "Pre-Depends",
            Self::Depends => "Depends",
            Self::Recommends => "Recommends",
            Self::Suggests => "Suggests",
            Self::Enhances => "Enhances",
            Self::Conflicts => "Conflicts",
            Self::Replaces => "Replaces",
            Self::Provides => "Provides",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.field_name())
    }
}

/// A [Relationship] is a typed clause belonging to one owner package: a
/// disjunction of [Possibility] values, any one of which satisfies the
/// clause (an `OR`).
///
/// A package's full set of requirements for a given field (e.g. all of its
/// `Depends`) is `Vec<Relationship>` -- each entry its own comma-separated
/// clause, all of which must hold (an `AND` across entries, an `OR` within
/// one entry's possibilities).
#[derive(Clone, Debug, PartialEq)]
pub struct Relationship {
    /// Which field this clause came from.
    pub kind: RelationKind,

    /// Set of [Possibility] values, any one of which satisfies this
    /// clause.
    pub possibilities: Vec<Possibility>,
}

impl Relationship {
    /// Parse the full value of one relationship field (e.g. the whole of
    /// a `Depends:` value) into its comma-separated clauses, all tagged
    /// with `kind`.
    pub fn parse_field(kind: RelationKind, value: &str) -> Result<Vec<Self>, Error> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(vec![]);
        }

        value
            .split(',')
            .map(|clause| {
                let possibilities = clause
                    .split('|')
                    .map(Possibility::parse)
                    .collect::<Result<Vec<_>, _>>()?;
                if possibilities.is_empty() {
                    return Err(Error::InvalidPossibility);
                }
                Ok(Relationship { kind, possibilities })
            })
            .collect()
    }
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.possibilities
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" | ")
        )
    }
}

/// Join a set of same-[RelationKind] [Relationship]s into the comma
/// separated field value used on the wire.
pub fn join_field(relationships: &[Relationship]) -> String {
    relationships
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Standalone parse of a single clause (no leading field name), used by
/// tests and by callers that already know the [RelationKind] out of band.
impl Relationship {
    /// Parse one `a | b (>= 1.0)`-shaped clause tagged with `kind`.
    pub fn parse_clause(kind: RelationKind, clause: &str) -> Result<Self, Error> {
        let possibilities = clause
            .split('|')
            .map(Possibility::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if possibilities.is_empty() {
            return Err(Error::InvalidPossibility);
        }
        Ok(Relationship { kind, possibilities })
    }
}

impl FromStr for RelationKind {
    type Err = Error;

    fn from_str(v: &str) -> Result<Self, Error> {
        Ok(match v {
            "Pre-Depends" => Self::PreDepends,
            "Depends" => Self::Depends,
            "Recommends" => Self::Recommends,
            "Suggests" => Self::Suggests,
            "Enhances" => Self::Enhances,
            "Conflicts" => Self::Conflicts,
            "Replaces" => Self::Replaces,
            "Provides" => Self::Provides,
            _ => return Err(Error::InvalidPossibility),
        })
    }
}


// vim: foldmethod=marker
