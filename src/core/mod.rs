//! Core modules for Essaymark

pub mod locator;
pub mod resolver;
pub mod markup;
pub mod reveal;
pub mod driver;
pub mod api;

pub use locator::{locate, locate_all, Located, LocatedSpan};
pub use resolver::SpanResolver;
pub use markup::{to_presentation, render_html, render_terminal};
pub use reveal::{RevealController, ScanConfig, ScanTimer};
pub use driver::ScanDriver;
pub use api::{create_router, run_server};
