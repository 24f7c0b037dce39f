//! Flutter-facing bridge for the Trainbook core.

pub mod api;
