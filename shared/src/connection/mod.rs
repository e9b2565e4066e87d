pub mod base_connection;
pub mod connection_config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod frame_header;
