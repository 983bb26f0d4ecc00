use thiserror::Error as ThisError;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors reported by [`AvlTreeMap`](crate::AvlTreeMap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum Error {
    /// The key is not present in the tree.
    #[error("key not found")]
    NotFound,

    /// The tree structure is corrupt. Only the diagnostic checks report this.
    #[error("tree invariant violated: {0}")]
    InvariantViolation(#[from] Violation),
}

/// The invariant a diagnostic walk found broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum Violation {
    /// An in-order walk did not produce strictly ascending keys.
    #[error("keys are not in strictly ascending order")]
    Order,

    /// A node's cached height disagrees with the height of its children.
    #[error("cached height {cached} does not match computed height {computed}")]
    HeightCache { cached: i32, computed: i32 },

    /// A node's subtrees differ in height by more than one.
    #[error("balance factor {factor} is outside -1..=1")]
    Balance { factor: i32 },

    /// The recorded entry count disagrees with the reachable entries.
    #[error("recorded length {recorded} does not match {counted} stored entries")]
    Length { recorded: usize, counted: usize },
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn messages() {
        assert_eq!(Error::NotFound.to_string(), "key not found");
        assert_eq!(
            Error::from(Violation::Balance { factor: 2 }).to_string(),
            "tree invariant violated: balance factor 2 is outside -1..=1"
        );
        assert_eq!(
            Violation::HeightCache { cached: 3, computed: 2 }.to_string(),
            "cached height 3 does not match computed height 2"
        );
    }

    #[test]
    fn violation_is_not_not_found() {
        let violation: Error = Violation::Order.into();
        assert_ne!(violation, Error::NotFound);
        assert!(matches!(violation, Error::InvariantViolation(Violation::Order)));
    }
}
