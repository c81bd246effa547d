pub mod context;
pub mod errors;

pub use context::{AppContext, AppStats};
pub use errors::AppError;
