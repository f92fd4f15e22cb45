pub mod record;
pub mod schema;
pub mod template;
