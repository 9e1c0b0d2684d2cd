mod amount;
mod entry;
mod limit;
mod normalize;

pub use amount::*;
pub use entry::*;
pub use limit::*;
pub use normalize::*;
