pub mod dataset;
pub mod error;
pub mod loader;
pub mod session;
pub mod split;

pub use dataset::Dataset;
pub use loader::{load_dataset, LoadOptions};
pub use session::Session;
pub use split::{random_split, train_test_split};
