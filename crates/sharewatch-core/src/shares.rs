//! Share names, share sets, and the mismatch report derived from them.
//!
//! A [`ShareSet`] is an ordered, deduplicated collection of [`ShareName`]s.
//! Two sets are produced per reconciliation run (configured vs. advertised)
//! and [`MismatchReport`] captures their differences. The report's
//! [`Fingerprint`] backs duplicate-notification suppression across runs.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

/// A non-empty token identifying a network share.
///
/// Valid names match `[A-Za-z0-9][A-Za-z0-9_-]*`. Names are case-sensitive
/// and compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShareName(String);

impl ShareName {
    /// Get the share name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(s: &str) -> bool {
        let mut chars = s.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphanumeric() => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }
}

impl FromStr for ShareName {
    type Err = InvalidShareName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_valid(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidShareName(s.to_string()))
        }
    }
}

impl fmt::Display for ShareName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error for a token that is not a valid share name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid share name: {0:?}")]
pub struct InvalidShareName(pub String);

/// An ordered set of share names.
///
/// Backed by a `BTreeSet`, so iteration is always in canonical sorted order
/// regardless of insertion order. This makes set differences and
/// fingerprinting deterministic without re-sorting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareSet(BTreeSet<ShareName>);

impl ShareSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a share name. Returns `false` if it was already present.
    pub fn insert(&mut self, name: ShareName) -> bool {
        self.0.insert(name)
    }

    /// Whether the set contains the given name.
    pub fn contains(&self, name: &ShareName) -> bool {
        self.0.contains(name)
    }

    /// Number of shares in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the names in canonical sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &ShareName> {
        self.0.iter()
    }

    /// Set difference: names in `self` but not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    /// Render the names as a bulleted list, one per line.
    pub fn bulleted(&self) -> String {
        self.0
            .iter()
            .map(|n| format!("  - {n}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl FromIterator<ShareName> for ShareSet {
    fn from_iter<T: IntoIterator<Item = ShareName>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ShareSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for name in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            f.write_str(name.as_str())?;
        }
        Ok(())
    }
}

/// Differences between the configured and the advertised share sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchReport {
    /// Configured locally but not advertised by the NAS.
    pub missing_on_nas: ShareSet,
    /// Advertised by the NAS but not configured locally.
    pub extra_on_nas: ShareSet,
}

impl MismatchReport {
    /// Compare the two sets. The report is empty iff they are equal.
    pub fn compare(configured: &ShareSet, available: &ShareSet) -> Self {
        Self {
            missing_on_nas: configured.difference(available),
            extra_on_nas: available.difference(configured),
        }
    }

    /// Whether the two sets were equal.
    pub fn is_empty(&self) -> bool {
        self.missing_on_nas.is_empty() && self.extra_on_nas.is_empty()
    }

    /// Stable digest of the report content.
    ///
    /// Identical report content always yields an identical fingerprint; the
    /// digest is used purely for change detection, not security.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Sha256::new();
        hasher.update(b"missing:");
        for name in self.missing_on_nas.iter() {
            hasher.update(name.as_str().as_bytes());
            hasher.update(b"\n");
        }
        hasher.update(b"extra:");
        for name in self.extra_on_nas.iter() {
            hasher.update(name.as_str().as_bytes());
            hasher.update(b"\n");
        }
        Fingerprint(format!("{:x}", hasher.finalize()))
    }
}

/// An opaque token identifying the content of a [`MismatchReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(pub String);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
