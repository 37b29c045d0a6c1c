//! Construction-time resource limits for the engine. The only configuration surface this crate
//! has — there is no config file format and no environment variable reads, matching spec.md's
//! "no persistence format" non-goal extended to configuration in general.

/// Default ceiling on self-recursive `compute` depth before a custom function's self-call is
/// treated as a runtime error rather than looping forever. Named, not inlined, matching the
/// `DEFAULT_MAX_RECURSION_DEPTH` convention of the reference crate's `resource.rs`.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 512;

/// Default ceiling on how many `branch` instructions may appear on a single root-to-leaf path of
/// a demonstration's branch tree.
pub const DEFAULT_MAX_BRANCH_DEPTH: usize = 128;

/// Resource knobs a [`crate::state::State`] is constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineLimits {
    pub max_recursion_depth: usize,
    pub max_branch_depth: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self { max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH, max_branch_depth: DEFAULT_MAX_BRANCH_DEPTH }
    }
}
