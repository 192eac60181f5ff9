pub mod clock;
pub mod request_body;
