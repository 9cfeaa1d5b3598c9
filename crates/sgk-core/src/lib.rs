pub mod error;
pub mod tolerance;
pub mod traits;

pub use error::{Result, SgkError};
pub use tolerance::{is_nearly_zero, Tolerance};
pub use traits::{BoundingBox, Validate};
