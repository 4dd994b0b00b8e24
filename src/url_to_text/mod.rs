//! Turning a recipe URL into plain text for the model.

mod fetcher;
mod page_text;

pub use fetcher::PageFetcher;
pub use page_text::html_to_text;
