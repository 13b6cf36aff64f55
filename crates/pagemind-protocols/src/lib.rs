//! # PageMind Protocols
//!
//! Core protocol definitions for the PageMind page assistant.
//! Contains only interface definitions and wire types - no implementations.
//!
//! ## Core Traits
//!
//! - [`LanguageModel`] - Capability probe and session factory of a model backend
//! - [`ModelSession`] - A single purpose-scoped session handle
//! - [`KeyValueStore`] - Timestamped persistent storage with TTL sweeping

pub mod error;
pub mod message;
pub mod model;
pub mod store;

pub use error::{ModelError, StoreError};
pub use message::{
    ChatRole, ChatTurn, OperationFlags, OperationKind, ReadingLevel, Request, Response, TabId,
};
pub use model::{
    Availability, LanguageModel, ModelSession, SessionOptions, SessionPurpose, SummaryFormat,
    SummaryLength, SummaryType,
};
pub use store::{ttl_cutoff_millis, KeyValueStore, StoredRecord, StoredValue, SweepReport};
