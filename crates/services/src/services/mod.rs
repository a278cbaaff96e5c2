pub mod campaign_cleanup;
pub mod config;
pub mod media_fixer;
pub mod theme_catalog;
pub mod theme_document;
pub mod theme_generator;
pub mod theme_preview;
pub mod theme_rng;
pub mod theme_storage;
