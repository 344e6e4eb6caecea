pub mod value;
pub mod combination;
pub mod diagnostics;
pub mod table;
pub mod errors;

pub use value::*;
pub use combination::*;
pub use diagnostics::*;
pub use table::*;
pub use errors::*;
