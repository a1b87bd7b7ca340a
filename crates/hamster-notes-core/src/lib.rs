//! Core of the notes-to-Hamster bridge: task-line composition, front-matter
//! metadata, and the time-tracker contracts the adapters implement.
//! Nothing in here touches the filesystem or the bus directly.

pub mod document;
pub mod frontmatter;
pub mod task;
pub mod timer;
pub mod tracker;
