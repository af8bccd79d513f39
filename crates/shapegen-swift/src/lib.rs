pub mod driver;
pub mod options;
pub mod profile;

pub use driver::SwiftClientDriver;
pub use options::SwiftOption;
pub use profile::SwiftTarget;
