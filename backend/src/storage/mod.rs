//! # Storage Layer
//!
//! Document-store persistence for the check-in service. A single
//! [`DbConnection`] owns the SQLite pool and schema; per-entity repositories
//! wrap it with typed operations. Every query that touches user-owned data is
//! scoped by the owning identifier, so ownership checks never rely on caller
//! discipline alone.

pub mod child_repository;
pub mod db;
pub mod guest_repository;
pub mod transition_repository;
pub mod user_repository;

pub use child_repository::ChildRepository;
pub use db::DbConnection;
pub use guest_repository::GuestRepository;
pub use transition_repository::TransitionRepository;
pub use user_repository::UserRepository;
