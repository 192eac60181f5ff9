pub mod encoding;
pub mod signing;
