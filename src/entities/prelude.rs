pub use super::images::Entity as Images;
pub use super::metadata::Entity as Metadata;
