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

use super::{Error, VersionConstraint};

/// A [Possibility] is the lowest level of a [crate::dependency::Relationship]
/// -- a specific package name which may be used to satisfy the requirement,
/// optionally limited to a range of versions.
///
/// In general you're unlikely to construct these directly; you'll see them
/// by parsing a [crate::dependency::Relationship].
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Possibility {
    /// Name of the package which may satisfy this possibility.
    pub target: String,

    /// This constraint limits the [crate::version::Version] of the target
    /// package which satisfies this [Possibility]. `None` means any
    /// installed version (or a bare `Provides`) will do.
    pub version_constraint: Option<VersionConstraint>,
}

impl std::fmt::Display for Possibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.target)?;
        if let Some(version_constraint) = &self.version_constraint {
            write!(f, " ({})", version_constraint)?;
        }
        Ok(())
    }
}

impl Possibility {
    /// Parse a single possibility, e.g. `libc6` or `libc6 (>= 2.19)`.
    pub(super) fn parse(token: &str) -> Result<Self, Error> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::InvalidPossibility);
        }

        let (name_part, constraint_part) = match token.find('(') {
            Some(idx) => {
                let close = token.rfind(')').ok_or(Error::InvalidVersionConstraint)?;
                if close < idx {
                    return Err(Error::InvalidVersionConstraint);
                }
                (&token[..idx], Some(&token[idx + 1..close]))
            }
            None => (token, None),
        };

        let name = name_part.trim();
        crate::package::validate_package_name(name).map_err(|_| Error::InvalidPossibility)?;

        let version_constraint = match constraint_part {
            Some(inner) => Some(VersionConstraint::parse(inner)?),
            None => None,
        };

        Ok(Possibility {
            target: name.to_owned(),
            version_constraint,
        })
    }
}


// vim: foldmethod=marker
