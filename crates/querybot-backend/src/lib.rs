pub mod provider;
pub mod wolfram;

pub use provider::{BackendError, ComputeBackend, QueryOutcome, ResultGroup, SubResult};
pub use wolfram::WolframAlphaClient;
