mod profile;
mod snapshot;
mod trophy;

pub use profile::*;
pub use snapshot::*;
pub use trophy::*;
