//! Error type shared by the simulator, its configuration and its logs.

/// Errors surfaced by the flat plate simulator.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// A configuration option is missing or out of range.
    Config {
        /// Offending option.
        field: String,
        /// What is wrong with it.
        message: String,
    },
    /// Target relocation could not satisfy the bearing constraint.
    RelocationExhausted {
        /// Candidates drawn.
        attempts: usize,
        /// Bearing limit off horizontal (degrees).
        threshold_deg: f64,
    },
    /// More episodes were started than `MAX_EPISODES` allows.
    EpisodeOverflow {
        /// Episode that was refused.
        episode: usize,
        /// `MAX_EPISODES`.
        max: usize,
    },
    /// More steps were taken in one episode than `MAX_STEPS` allows.
    StepOverflow {
        /// Step that was refused.
        step: usize,
        /// `MAX_STEPS`.
        max: usize,
    },
    /// `step` was called after the episode terminated.
    EpisodeDone,
    /// A history buffer index is out of its pre-allocated range.
    HistoryOverflow {
        /// Which history overflowed.
        what: &'static str,
        /// Index that did not fit.
        index: usize,
        /// Pre-allocated length.
        capacity: usize,
    },
    /// Failed to read a configuration file.
    Io {
        /// File that could not be read.
        path: String,
        /// Underlying I/O error message.
        source: String,
    },
    /// Failed to parse a configuration document.
    Parse {
        /// Parser error message.
        source: String,
    },
}

impl SimError {
    pub(crate) fn config(field: &str, message: impl Into<String>) -> Self {
        SimError::Config {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::Config { field, message } => {
                write!(f, "Invalid configuration '{}': {}", field, message)
            }
            SimError::RelocationExhausted {
                attempts,
                threshold_deg,
            } => write!(
                f,
                "No target point with a bearing from A at most {}° off horizontal after {} attempts; check XB and the vertical offset",
                threshold_deg, attempts
            ),
            SimError::EpisodeOverflow { episode, max } => {
                write!(f, "Episode {} exceeds MAX_EPISODES = {}", episode, max)
            }
            SimError::StepOverflow { step, max } => {
                write!(f, "Step {} exceeds MAX_STEPS = {}", step, max)
            }
            SimError::EpisodeDone => write!(f, "Episode is done; call reset() before stepping"),
            SimError::HistoryOverflow {
                what,
                index,
                capacity,
            } => write!(
                f,
                "{} index {} is outside the pre-allocated capacity {}",
                what, index, capacity
            ),
            SimError::Io { path, source } => {
                write!(f, "Failed to read config file '{}': {}", path, source)
            }
            SimError::Parse { source } => write!(f, "Failed to parse config: {}", source),
        }
    }
}

impl std::error::Error for SimError {}

/// Convenience alias for simulator results.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relocation_message_names_horizontal_bearing() {
        let err = SimError::RelocationExhausted {
            attempts: 50,
            threshold_deg: 10.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("10° off horizontal"), "{}", msg);
        assert!(msg.contains("50 attempts"), "{}", msg);
    }

    #[test]
    fn test_config_helper() {
        let err = SimError::config("XB", "must be finite");
        assert_eq!(err.to_string(), "Invalid configuration 'XB': must be finite");
    }
}
