pub mod driver;
pub mod options;
pub mod problem;
pub mod profile;

pub use driver::{JaxRsDriver, ReactiveDriver};
pub use options::JvmOption;
pub use problem::JvmProblemLibrary;
pub use profile::JvmTarget;
