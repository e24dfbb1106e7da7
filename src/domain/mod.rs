pub mod listing;
pub mod post;
pub mod token;

pub use listing::{Baseline, ListingChild, ListingData, ListingPage, ListingResponse};
pub use post::Post;
pub use token::BearerToken;
