pub mod labels;
pub mod model;
pub mod preprocess;
pub mod service;

pub use service::InferenceService;
