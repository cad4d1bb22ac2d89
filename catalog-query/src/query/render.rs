use std::fmt;

use super::ServiceQuery;

/// Canonical form used as a log and dedup key.
/// Namespace and partition are not part of it.
impl fmt::Display for ServiceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("catalog.service(")?;
        if !self.tag.is_empty() {
            write!(f, "{}.", self.tag)?;
        }
        f.write_str(&self.name)?;
        if !self.dc.is_empty() {
            write!(f, "@{}", self.dc)?;
        }
        if !self.near.is_empty() {
            write!(f, "~{}", self.near)?;
        }
        f.write_str(")")
    }
}
