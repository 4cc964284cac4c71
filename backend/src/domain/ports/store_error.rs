//! Error type shared by every repository port.

use pagination::PaginationError;

use super::define_port_error;

define_port_error! {
    /// Errors raised by the recipe store and its transaction coordinator.
    pub enum StoreError {
        /// A pooled connection could not be obtained.
        Connection { message: String } =>
            "store connection failed: {message}",
        /// A query or mutation failed during execution.
        Query { message: String } =>
            "store query failed: {message}",
        /// The addressed record does not exist.
        NotFound { entity: String } =>
            "{entity} was not found",
        /// A write collided with a unique key, such as a taken email.
        Conflict { message: String } =>
            "store conflict: {message}",
        /// The client supplied a cursor that does not fit the listing.
        Pagination { message: String } =>
            "invalid pagination cursor: {message}",
        /// Opening a transaction failed.
        TransactionStart { message: String } =>
            "failed to establish transaction: {message}",
        /// Committing a transaction failed; the writes were not persisted.
        TransactionCommit { message: String } =>
            "failed to commit transaction: {message}",
    }
}

impl From<PaginationError> for StoreError {
    fn from(error: PaginationError) -> Self {
        Self::pagination(error.to_string())
    }
}
