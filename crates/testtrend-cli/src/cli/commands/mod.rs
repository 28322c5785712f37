pub mod dispatch;
pub(crate) mod history;
pub(crate) mod output;
pub(crate) mod projects;
pub(crate) mod summary;
pub(crate) mod trend;

pub use dispatch::dispatch;
