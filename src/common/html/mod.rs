//! HTML text helpers used on de-encapsulated output.

mod escape;

pub use escape::unescape_html_entities;
