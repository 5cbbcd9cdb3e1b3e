//! Domain services used by the dashboard routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and collaborator access so route
//! handlers can stay focused on protocol translation and auth plumbing.

pub mod categories;
pub mod directory;
pub mod guard;
pub mod identity;
pub mod storage;
pub mod users;
