//! Built-in pipeline tasks, wired into the default task order by
//! `Pipeline::default_registry`: 100 (implement, required), 200 (refactor,
//! optional).

pub mod implement;
pub mod refactor;
