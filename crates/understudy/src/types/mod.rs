pub mod desc;
pub mod registry;
