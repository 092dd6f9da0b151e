pub mod aggregator;
pub mod config;
pub mod edit_stream;
pub mod error;
pub mod response_format;
pub mod stream_event;
