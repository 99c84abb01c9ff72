pub mod indicator_models;
pub mod indicator_service;

pub use indicator_models::{
    CopiedDocument, CreatedIndicator, DocumentStore, IndicatorConfig, NewIndicator,
};
pub use indicator_service::IndicatorService;
