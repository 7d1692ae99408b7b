pub mod config;
pub mod error;
pub mod record;
pub mod value;

pub use config::{HeaderCapture, LoggerConfig, SinkConfig};
pub use error::ReqlogError;
pub use record::LogRecord;
pub use value::LogValue;
