pub mod confirmation_token;

pub use confirmation_token::{TokenIssuer, TokenVerifier, VerifiedSubject};
