//! # Inheritance Tests
//!
//! Member lookup through superclasses, mixins and interfaces of classes
//! declared in source, conflict reporting, and subclass queries.

pub mod member_lookup;
pub mod subtypes;
