/// Catalog item record and category access
pub mod item;
