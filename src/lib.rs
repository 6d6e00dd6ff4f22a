pub mod action;
pub mod app;
pub mod article;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod feed;
pub mod filter;
pub mod logging;
pub mod normalize;
pub mod portal;
pub mod stats;
pub mod ui;
pub mod view;

pub use controller::Controller;
pub use error::{FeedError, NormalizationError};
