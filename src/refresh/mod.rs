pub mod decision;

pub use decision::{decide_refresh, RefreshDecision, RefreshReason};
