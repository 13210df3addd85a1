pub mod artifact;
pub mod conversion;
pub mod definition;
pub mod options;

pub use artifact::*;
pub use conversion::*;
pub use definition::*;
pub use options::*;
