pub mod aggregate;
pub mod class;
pub mod record;
