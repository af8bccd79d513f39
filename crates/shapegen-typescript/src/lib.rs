pub mod driver;
pub mod options;
pub mod profile;

pub use driver::TypeScriptClientDriver;
pub use options::TypeScriptOption;
pub use profile::TypeScriptTarget;
