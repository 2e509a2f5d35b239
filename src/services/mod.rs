pub mod menu_service;
pub mod ranking;

pub use menu_service::{MenuService, TargetSpec};
pub use ranking::{MoveOutcome, RankedListManager};
