use alloc::string::String;

/// Failure reported by [`OrderedIndex`](crate::OrderedIndex) operations.
///
/// Only removal can fail; every other operation is total.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum IndexError {
    /// No record with the requested key is stored in the index. The index is unchanged.
    #[error("record not found: {surname} (id {id})")]
    NotFound {
        /// Surname part of the requested key.
        surname: String,
        /// Id part of the requested key.
        id: i64,
    },
}

/// Result alias for index operations.
pub type Result<T> = core::result::Result<T, IndexError>;
