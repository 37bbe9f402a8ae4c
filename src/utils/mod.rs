pub mod dates;
pub mod response;
pub mod validation;

pub use dates::*;
pub use response::*;
pub use validation::*;
