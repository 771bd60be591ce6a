mod analysis;
mod api;
mod avatar;
mod camera;
mod component;
mod interaction;
mod layout;
mod loader;
mod palette;
mod render;
mod state;
mod types;

pub use component::CandidateGraph;
