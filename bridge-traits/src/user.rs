use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a host application user.
///
/// Preferences, tokens and contacts are all scoped by this id. The host owns
/// the numbering; the core only passes it through.
///
/// # Examples
///
/// ```
/// use bridge_traits::UserId;
///
/// let user = UserId::new(42);
/// assert_eq!(user.as_i64(), 42);
/// assert_eq!(user.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}
