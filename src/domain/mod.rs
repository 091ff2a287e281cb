pub mod errors;
pub mod models;
pub mod profile;
pub mod scanner;

pub use errors::*;
pub use models::*;
pub use profile::*;
pub use scanner::*;
