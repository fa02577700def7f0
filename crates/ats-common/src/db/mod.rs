pub mod applications;
pub mod candidates;
pub mod pool;

// Keep re-exports unique so downstream crates see a single symbol per helper.
pub use applications::{clear_flag, flag_for_review, ApplicationStorageError};
pub use candidates::PgCandidateStore;
pub use pool::{create_pool, DbPoolError, PgPool};

use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;

use crate::store::StoreError;

impl From<PoolError> for StoreError {
    fn from(value: PoolError) -> Self {
        StoreError::Unavailable(value.to_string())
    }
}

impl From<PgError> for StoreError {
    fn from(value: PgError) -> Self {
        StoreError::Unavailable(value.to_string())
    }
}
