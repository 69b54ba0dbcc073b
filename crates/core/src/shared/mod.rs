pub mod bbox;
pub mod constants;
pub mod draw;
pub mod execution_provider;
pub mod frame;
pub mod model_resolver;
pub mod video_metadata;
