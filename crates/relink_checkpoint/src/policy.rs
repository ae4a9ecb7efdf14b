//! Flush cadence.

/// How often the checkpoint is written to disk.
///
/// # Examples
///
/// ```
/// use relink_checkpoint::CheckpointPolicy;
///
/// assert_eq!(CheckpointPolicy::from_flush_every(1), CheckpointPolicy::EveryRecord);
/// assert_eq!(CheckpointPolicy::from_flush_every(50), CheckpointPolicy::Batched(50));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, derive_more::Display)]
pub enum CheckpointPolicy {
    /// Flush before every `record` call returns
    #[default]
    #[display("every record")]
    EveryRecord,
    /// Flush once this many records are pending, and on `flush`/drop
    #[display("every {} records", _0)]
    Batched(usize),
}

impl CheckpointPolicy {
    /// Build a policy from a "flush every N records" setting.
    ///
    /// Zero and one both mean every record.
    pub fn from_flush_every(n: usize) -> Self {
        if n <= 1 {
            Self::EveryRecord
        } else {
            Self::Batched(n)
        }
    }

    /// Whether `dirty` unsaved records warrant a flush.
    pub fn should_flush(&self, dirty: usize) -> bool {
        match self {
            Self::EveryRecord => dirty > 0,
            Self::Batched(n) => dirty >= *n,
        }
    }
}
