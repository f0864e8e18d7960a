pub mod history;
pub mod properties;
pub mod tools;
