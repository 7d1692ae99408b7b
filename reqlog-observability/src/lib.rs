pub mod render;
pub mod scrubber;
pub mod sink;

pub use scrubber::{KeyRedactor, Sanitizer, sanitize};
pub use sink::{LogSink, MemorySink, StdoutSink, TracingSink};
