mod admission;
mod error;
#[cfg(test)]
mod tests;

pub use admission::*;
pub use error::*;
