use super::transition::TransitionPolicy;

/// Tunables for the application lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    pub max_resume_bytes: usize,
    pub transition_policy: TransitionPolicy,
}

impl LifecycleConfig {
    pub const DEFAULT_MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_resume_bytes: Self::DEFAULT_MAX_RESUME_BYTES,
            transition_policy: TransitionPolicy::default(),
        }
    }
}
