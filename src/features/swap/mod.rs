mod artifact;
pub mod handler;
pub mod models;
mod runner;
mod service;
mod workspace;

pub use artifact::ResponseArtifact;
pub use handler::{create_swap_router, post_swap};
pub use models::{OUTPUT_FILENAME, OUTPUT_MEDIA_TYPE, SwapForm};
pub use runner::{FaceFusionRunner, ToolOutput};
pub use service::SwapService;
pub use workspace::ScratchWorkspace;
