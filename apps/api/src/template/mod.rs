// Template tree: model, section index, structural checks, and the service/HTTP
// layer that loads, saves and compiles templates.

pub mod handlers;
pub mod index;
pub mod model;
pub mod service;
pub mod structure;

pub use model::Template;
