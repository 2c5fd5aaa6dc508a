//! Data models and configuration.

pub mod config;
pub mod page;
pub mod report;

pub use config::PagewiseConfig;
pub use page::{
    BoundingBox, Classification, EmbeddedImage, ExtractionMethod, FigureRegion, PageContent,
    PageKind, PageRasters, PageResult,
};
pub use report::{DocumentReport, PageReport};
