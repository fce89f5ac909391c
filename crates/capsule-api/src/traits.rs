use crate::{entities::ModuleCapsule, errors::CapsuleResult};

/// Renders one generated artifact from an assembled capsule
///
/// Implementations must iterate `capsule.groups` and each group's
/// `functions` in order, so that slot indices agree across artifacts.
///
/// # Example
/// ```rust,ignore
/// struct SlotList;
///
/// impl CapsuleEmitter for SlotList {
///     fn artifact(&self) -> &str {
///         "slot list"
///     }
///
///     fn emit(&self, capsule: &ModuleCapsule) -> CapsuleResult<String> {
///         // ...
///     }
/// }
/// ```
pub trait CapsuleEmitter: Send + Sync {
    /// Short artifact name, used in logs
    fn artifact(&self) -> &str;

    /// Render the full file contents
    fn emit(&self, capsule: &ModuleCapsule) -> CapsuleResult<String>;
}
