//! Stateless services used by the workflow controller
//!
//! - `schema_validator`: untrusted JSON → typed analysis result
//! - `upload_client`: file submission
//! - `analysis_client`: analysis invocation

pub mod analysis_client;
pub mod schema_validator;
pub mod upload_client;

pub use analysis_client::AnalysisClient;
pub use schema_validator::validate;
pub use upload_client::{UploadClient, UPLOAD_FIELD};
