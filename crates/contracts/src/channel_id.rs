//! ChannelId - canonical channel identifier
//!
//! The upstream transport encodes the same group chat id in two equivalent
//! textual forms: the full supergroup form `-100<digits>` and the short form
//! `-<digits>`. Canonicalization happens once, here, at the boundary; every
//! comparison afterwards uses only canonical ids.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Canonical channel identifier with cheap cloning.
///
/// Internally `Arc<str>` so cloning only bumps a reference count. Constructed
/// from any accepted encoding; stores the canonical short form.
///
/// # Examples
/// ```
/// use contracts::ChannelId;
///
/// let full = ChannelId::new("-1003217044000");
/// let short = ChannelId::new("-3217044000");
/// assert_eq!(full, short);
/// assert_eq!(full.as_str(), "-3217044000");
/// ```
#[derive(Clone)]
pub struct ChannelId(Arc<str>);

impl ChannelId {
    /// Create a ChannelId, canonicalizing the raw encoding.
    pub fn new(raw: &str) -> Self {
        Self(Arc::from(canonicalize(raw)))
    }

    /// Get the canonical string form.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a raw, possibly non-canonical id refers to this channel.
    pub fn matches_raw(&self, raw: &str) -> bool {
        canonicalize(raw) == *self.0
    }
}

/// Collapse the supergroup prefix: `-100<digits>` becomes `-<digits>`.
/// Anything else passes through trimmed.
fn canonicalize(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("-100") {
        if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
            return format!("-{rest}");
        }
    }
    trimmed.to_string()
}

impl Deref for ChannelId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ChannelId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ChannelId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({:?})", self.0)
    }
}

impl PartialEq for ChannelId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for ChannelId {}

impl Hash for ChannelId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Serialize for ChannelId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ChannelId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}
