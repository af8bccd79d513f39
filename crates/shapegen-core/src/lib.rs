pub mod config;
pub mod driver;
pub mod error;
pub mod ir;
pub mod media_type;
pub mod naming;
pub mod parse;
pub mod pipeline;
pub mod problem;
pub mod registry;
pub mod resolve;
pub mod schema;
pub mod target;

pub use error::{ConfigError, GenerationError, ParseError, ResolveError};
pub use pipeline::{Generation, GenerationOptions, generate};
pub use registry::GeneratedTypes;
