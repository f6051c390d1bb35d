pub mod jwt;
pub mod validate;

pub use jwt::{Claims, TokenVerifier};
pub use validate::{PathParams, ValidatedJson, ValidatedQuery};
