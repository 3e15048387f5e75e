pub mod posters;
pub mod recommendations;
pub mod retry;

pub use posters::PosterResolver;
