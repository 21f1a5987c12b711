//! Per-visitor models kept in the session.

pub mod session;

pub use session::{CartSnapshot, CurrentCustomer, Notice, NoticeLevel, session_keys};
