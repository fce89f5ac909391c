pub mod capsule;
pub mod group;
pub mod signature;

pub use capsule::ModuleCapsule;
pub use group::{version_tag, ApiGroup};
pub use signature::FunctionSignature;
