pub mod monitor_session;
pub mod pipeline_logger;
