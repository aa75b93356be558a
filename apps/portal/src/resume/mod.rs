// Resume builder: document container, derived completion, profile import.
// Handlers are thin; all document rules live in `manager`.

pub mod completeness;
pub mod handlers;
pub mod import;
pub mod manager;

pub use manager::ResumeManager;
