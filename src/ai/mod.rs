pub mod prompt;
pub mod rag;
pub mod reviews;
pub mod services;
