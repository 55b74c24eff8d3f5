pub mod json;
pub mod time;
pub mod token;
pub mod validation;
