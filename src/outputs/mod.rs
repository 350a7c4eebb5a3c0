//! Output generation: the event pages and the listings.
//!
//! # Submodules
//!
//! - [`views`]: the values shown on a page, computed from an event
//! - [`templates`]: HTML layout of the event and listing pages
//! - [`listings`]: which events go in the upcoming, past and all listings
//! - [`pages`]: renders through the templates and writes the files

pub mod listings;
pub mod pages;
pub mod templates;
pub mod views;
