use typed_builder::TypedBuilder;

/// Consecutive denials of one operation after which deadlock detection runs.
pub const DEFAULT_DEADLOCK_THRESHOLD: u32 = 10;

/// Tuning knobs of a [`Scheduler`](crate::scheduler::Scheduler).
///
/// ```rust
/// use lockstep_core::config::SchedulerConfig;
///
/// let config = SchedulerConfig::builder().deadlock_threshold(3).build();
/// assert_eq!(config.deadlock_threshold, 3);
/// assert_eq!(SchedulerConfig::default().deadlock_threshold, 10);
/// ```
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, TypedBuilder)]
pub struct SchedulerConfig {
    /// A value of `0` behaves like `1`: detection after every denial.
    #[builder(default = DEFAULT_DEADLOCK_THRESHOLD)]
    pub deadlock_threshold: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
