//! Application orchestration: the triage engine, its collaborators, and
//! terminal input.

pub mod engine;
pub mod event;
pub mod viewer;
