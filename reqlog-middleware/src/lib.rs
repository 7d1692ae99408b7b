pub mod app;
mod emit;
pub mod env;
pub mod filter;
pub mod head_override;
pub mod headers;
pub mod options;
pub mod recorder;
pub mod route;

pub use app::{App, ErrorSignal, Exception, Halt, Response};
pub use env::{LogHandoff, RequestEnv, RouteInfo};
pub use filter::{KeyFilter, ParameterFilter};
pub use head_override::HeadOverride;
pub use options::{Defaults, ExceptionHook, Options};
pub use recorder::{LogPhase, RequestLogger};
