/// Answers whether the process may record audio right now.
///
/// Queried synchronously on every start request; the engine never caches
/// the answer.
pub trait PermissionOracle: Send + Sync {
    fn has_record_permission(&self) -> bool;
}

/// Oracle with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermission(pub bool);

impl PermissionOracle for StaticPermission {
    fn has_record_permission(&self) -> bool {
        self.0
    }
}
