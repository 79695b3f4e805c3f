mod error;
mod exit_code;
mod retry;
mod traits;

pub use error::{RepositoryError, Result};
pub use exit_code::repository_error_to_exit_code;
pub use retry::ReadRetryPolicy;
pub use traits::DocumentStore;
