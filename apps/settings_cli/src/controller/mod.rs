//! Terminal-side controller layer: worker events and command orchestration.

pub mod events;
pub mod orchestration;
