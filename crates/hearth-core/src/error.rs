//! Shared error types.

/// Uniform failure reported by a coordinator refresh.
///
/// Data-source faults are opaque to the platform: whatever a fetch raises is
/// wrapped here, logged, and converted to entity unavailability. It is never
/// allowed to take down the scheduler.
#[derive(Debug, thiserror::Error)]
#[error("update failed: {0}")]
pub struct UpdateFailed(#[from] pub anyhow::Error);

impl UpdateFailed {
    /// The original fault raised by the data source.
    pub fn cause(&self) -> &anyhow::Error {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_failed_carries_cause() {
        let err = UpdateFailed(anyhow::anyhow!("connection refused"));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.cause().to_string(), "connection refused");
    }
}
