//! Response envelope types exposed to outer collaborators.

use serde::{Deserialize, Serialize};

/// Standard success envelope for mutations: `{success: true, data}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSuccess<T> {
    /// Always `true`; failures travel as errors, never as this envelope.
    pub success: bool,
    /// The created/updated row(s).
    pub data: T,
}

impl<T> ApiSuccess<T> {
    /// Wrap a payload in the success envelope.
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Outcome of a listing query.
///
/// "Found nothing" is a distinct outcome from an error, so outer layers can
/// answer with an explicit no-content status instead of an empty body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Listing<T> {
    /// The query matched no rows.
    Empty,
    /// The query matched at least one row.
    Items(Vec<T>),
}

impl<T> Listing<T> {
    /// Build a listing from a query result, collapsing empty vectors.
    pub fn from_rows(rows: Vec<T>) -> Self {
        if rows.is_empty() {
            Self::Empty
        } else {
            Self::Items(rows)
        }
    }

    /// Whether the listing matched no rows.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_collapses_empty() {
        let listing: Listing<i64> = Listing::from_rows(vec![]);
        assert!(listing.is_empty());
        assert!(!Listing::from_rows(vec![1]).is_empty());
    }
}
