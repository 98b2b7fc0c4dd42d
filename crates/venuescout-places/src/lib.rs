pub mod client;
pub mod error;
pub mod normalize;
pub mod retry;
pub mod source;
pub mod status;
pub mod types;

pub use client::PlacesClient;
pub use error::PlacesError;
pub use status::PlacesStatus;
