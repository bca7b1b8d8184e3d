use thiserror::Error;

/// Errors reported by a [`Broker`](super::Broker) implementation.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Broker queue is full")]
    QueueFull,

    #[error("Broker session is closed")]
    Closed,

    #[error("Broker rejected message: {0}")]
    Rejected(String),

    #[error("Broker client error: {0}")]
    Client(#[from] anyhow::Error),
}

/// Outcome of publishing a batch.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Publisher is shut down")]
    Cancelled,

    #[error("Failed to encode event {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to enqueue event {key}: {source}")]
    Enqueue {
        key: String,
        #[source]
        source: BrokerError,
    },

    #[error("Delivery of event {key} failed: {source}")]
    Delivery {
        key: String,
        #[source]
        source: BrokerError,
    },

    #[error("{missing} delivery report(s) never arrived")]
    ReportsLost { missing: usize },

    /// Several failures from one batch, none of them dropped.
    #[error("{}", join_messages(.0))]
    Joined(Vec<PublishError>),

    #[error("Publish failed after {attempts} attempt(s): {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<PublishError>,
    },

    #[error("Failed to connect to broker: {0}")]
    Connect(#[source] BrokerError),
}

impl PublishError {
    /// Combine batch failures: nothing, a single error, or all of them.
    pub fn join(mut errors: Vec<PublishError>) -> Option<PublishError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(PublishError::Joined(errors)),
        }
    }

    /// The individual failures, with joins and retry wrappers flattened.
    pub fn leaves(&self) -> Vec<&PublishError> {
        match self {
            PublishError::Joined(errors) => errors.iter().flat_map(|e| e.leaves()).collect(),
            PublishError::Exhausted { source, .. } => source.leaves(),
            other => vec![other],
        }
    }
}

fn join_messages(errors: &[PublishError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery(key: &str) -> PublishError {
        PublishError::Delivery {
            key: key.to_string(),
            source: BrokerError::Rejected("nope".to_string()),
        }
    }

    #[test]
    fn test_join() {
        assert!(PublishError::join(Vec::new()).is_none());
        assert!(matches!(
            PublishError::join(vec![PublishError::Cancelled]),
            Some(PublishError::Cancelled)
        ));

        let joined = PublishError::join(vec![delivery("a"), delivery("b")]).unwrap();
        let message = joined.to_string();
        assert!(message.contains("event a"));
        assert!(message.contains("event b"));
        assert_eq!(joined.leaves().len(), 2);
    }

    #[test]
    fn test_leaves_unwraps_exhausted() {
        let err = PublishError::Exhausted {
            attempts: 3,
            source: Box::new(PublishError::Joined(vec![delivery("a"), delivery("b")])),
        };
        assert_eq!(err.leaves().len(), 2);
    }
}
