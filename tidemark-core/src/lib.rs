//! Tidemark core library — domain types, canonical values, key registry, errors.
//!
//! Public API surface:
//! - [`types`] — newtypes and domain structs
//! - [`value`] — [`SettingValue`] and coercion
//! - [`registry`] — [`KeyRegistry`] lookup + overlay loading
//! - [`error`] — [`RegistryError`], [`ValueError`]

pub mod error;
pub mod registry;
pub mod types;
pub mod value;

pub use error::{RegistryError, ValueError};
pub use registry::KeyRegistry;
pub use types::{
    DeclaredSource, KeyDescriptor, Mutability, RawSetting, SettingEntry, SettingName,
    SettingsDocument, SettingsMap, SourceTag, ValueKind,
};
pub use value::SettingValue;
