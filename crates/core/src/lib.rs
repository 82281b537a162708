pub mod date;
pub mod extract;
pub mod notation;
pub mod roles;

pub use date::{NormalizedDate, ParseDateError};
pub use extract::{repair_fused_dates, DateExtractor, RawDateToken};
pub use notation::DateNotation;
pub use roles::DateRoles;
