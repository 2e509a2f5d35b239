pub mod permissions;

pub use permissions::{Actor, ChangeGuard};
