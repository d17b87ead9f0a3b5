//! `contentmart-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by every marketplace
//! crate: typed identifiers, the error model, and the persistence contracts
//! (repository + unit of work) that services are written against.

pub mod entity;
pub mod error;
pub mod id;
pub mod repository;
pub mod table;
pub mod version;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{
    ContentFileId, OrderId, PackageId, PackageStateId, ProfileId, PropertyId, PropertyStateId,
    UserId,
};
pub use repository::{Repository, UnitOfWork};
pub use table::Table;
pub use version::ExpectedVersion;
