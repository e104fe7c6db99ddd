//! Controller layer: events crossing from the backend thread to the UI.

pub mod events;
