pub mod plain_text;
pub mod validation;

pub use plain_text::*;
pub use validation::*;
