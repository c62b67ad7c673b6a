pub mod models;
pub mod operations;
pub mod types;

pub use models::*;
pub use operations::*;
pub use types::{ApiInfo, CodeGenData, ExtensionSite, NormalizedName, Service};
