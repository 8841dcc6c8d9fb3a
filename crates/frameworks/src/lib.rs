//! Target framework monikers and the compatibility relation between them.

pub mod error;
mod framework;
mod known;
mod resolver;

pub use crate::framework::{Family, Framework, FrameworkVersion, normalize_moniker};
pub use crate::known::{COMPATIBILITY_MAPPINGS, CompatibilityMapping, FrameworkRange, KNOWN_FRAMEWORKS};
pub use crate::resolver::{ANY_FRAMEWORK, Resolver, compatible_frameworks};
