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

use super::Error;
use crate::version::Version;

/// Version constraint operator, used to limit the way a [Version] number is
/// compared to a package's [Version].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VersionOperator {
    /// Equal operator (`=`), which indicates an exact match in version
    /// number.
    Equal,

    /// GreaterThan operator (`>>`), which indicates the version must be
    /// strictly greater than the indicated Version.
    GreaterThan,

    /// LessThan operator (`<<`), which indicates the version must be
    /// strictly smaller than the indicated Version.
    LessThan,

    /// GreaterThanOrEqual operator (`>=`) which indicates the version must
    /// be greater than or equal to, the indicated version.
    GreaterThanOrEqual,

    /// LessThanOrEqual operator (`<=`) which indicates the version must be
    /// less than or equal to, the indicated version.
    LessThanOrEqual,
}

impl VersionOperator {
    /// Return the [VersionOperator] as a borrowed string ref, in the form
    /// written in a control file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::GreaterThan => ">>",
            Self::LessThan => "<<",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThanOrEqual => "<=",
        }
    }

    /// Parse an operator token.
    fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "=" => Self::Equal,
            ">>" => Self::GreaterThan,
            "<<" => Self::LessThan,
            ">=" => Self::GreaterThanOrEqual,
            "<=" => Self::LessThanOrEqual,
            _ => return None,
        })
    }

    /// Evaluate `candidate <op> required` -- whether a candidate [Version]
    /// satisfies this operator against a required [Version].
    pub fn satisfied_by(&self, candidate: &Version, required: &Version) -> bool {
        use std::cmp::Ordering;
        match (self, candidate.cmp(required)) {
            (Self::Equal, Ordering::Equal) => true,
            (Self::GreaterThan, Ordering::Greater) => true,
            (Self::LessThan, Ordering::Less) => true,
            (Self::GreaterThanOrEqual, Ordering::Greater | Ordering::Equal) => true,
            (Self::LessThanOrEqual, Ordering::Less | Ordering::Equal) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for VersionOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A [VersionConstraint] limits a [crate::dependency::Possibility] to only be
/// considered on a subset of all [Version] values. The [VersionOperator]
/// defines how the [Version]s are compared.
#[derive(Clone, Debug, PartialEq)]
pub struct VersionConstraint {
    /// Comparison to use when evaluating if a [crate::dependency::Possibility]
    /// satisfies this constraint.
    pub operator: VersionOperator,

    /// Specific [Version] to compare a package against.
    pub version: Version,
}

impl std::fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.operator, self.version)
    }
}

impl VersionConstraint {
    /// Parse the contents of a `(<op> <version>)` group, with the
    /// surrounding parens already stripped.
    pub(super) fn parse(inner: &str) -> Result<Self, Error> {
        let inner = inner.trim();
        let split_at = inner
            .find(|c: char| !matches!(c, '=' | '<' | '>'))
            .ok_or(Error::InvalidVersionConstraint)?;
        let (op_token, rest) = inner.split_at(split_at);
        let operator = VersionOperator::parse(op_token).ok_or(Error::InvalidVersionConstraint)?;
        let version: Version = rest.trim().parse()?;
        Ok(VersionConstraint { operator, version })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_each_operator() {
        assert_eq!(
            VersionOperator::Equal,
            VersionConstraint::parse("= 1.0").unwrap().operator
        );
        assert_eq!(
            VersionOperator::GreaterThanOrEqual,
            VersionConstraint::parse(">= 1.0").unwrap().operator
        );
        assert_eq!(
            VersionOperator::LessThanOrEqual,
            VersionConstraint::parse("<= 1.0").unwrap().operator
        );
        assert_eq!(
            VersionOperator::GreaterThan,
            VersionConstraint::parse(">> 1.0").unwrap().operator
        );
        assert_eq!(
            VersionOperator::LessThan,
            VersionConstraint::parse("<< 1.0").unwrap().operator
        );
    }

    #[test]
    fn bad_operator_rejected() {
        assert!(VersionConstraint::parse("~ 1.0").is_err());
        assert!(VersionConstraint::parse("1.0").is_err());
    }

    #[test]
    fn satisfied_by_strict() {
        let v1: Version = "1.0".parse().unwrap();
        let v2: Version = "2.0".parse().unwrap();
        assert!(VersionOperator::GreaterThan.satisfied_by(&v2, &v1));
        assert!(!VersionOperator::GreaterThan.satisfied_by(&v1, &v1));
        assert!(VersionOperator::GreaterThanOrEqual.satisfied_by(&v1, &v1));
    }
}

// vim: foldmethod=marker
