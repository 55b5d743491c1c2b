pub mod append;
pub mod list;

pub use append::run as append;
pub use list::run as list;
