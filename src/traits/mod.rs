pub mod driver;

pub use driver::{Confirmation, Driver};
