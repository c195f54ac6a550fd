use argmin::core::{ArgminError, Error};

use crate::ctd::errors::TypeError;

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Type optimization ----
    /// The score of the character is not finite.
    DegenerateType {
        iteration: usize,
        value: f64,
    },

    /// A parameter block could not be mapped back onto its feasible set.
    ProjectionFailure {
        block: String,
        reason: &'static str,
        scores: Vec<f64>,
    },

    // ---- TypeOptOptions ----
    /// Learning rate needs to be positive and finite.
    InvalidLearningRate {
        value: f64,
        reason: &'static str,
    },
    /// Feasibility tolerance needs to be positive and finite.
    InvalidEps {
        value: f64,
        reason: &'static str,
    },
    /// Number of iterations needs to be positive.
    InvalidNIter {
        n_iter: usize,
        reason: &'static str,
    },
    /// Logging interval needs to be positive.
    InvalidLogEvery {
        every: usize,
    },

    // ---- Parameter layout ----
    /// A block of the layout is ill-formed.
    InvalidLayout {
        block: String,
        reason: &'static str,
    },
    /// Parameter vector length does not match the layout.
    ThetaLengthMismatch {
        expected: usize,
        found: usize,
    },

    // ---- Gradient ----
    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Gradient elements need to be finite
    InvalidGradient {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    // ---- Optimizer outcome ----
    /// Final parameters must be finite.
    InvalidThetaHat {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// Theta hat is missing
    MissingThetaHat,

    // ---- Model ----
    /// Failure inside the character type distribution.
    Type(TypeError),

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter {
        text: String,
    },
    /// Wrapper for argmin::NotImplemented
    NotImplemented {
        text: String,
    },
    /// Wrapper for argmin::NotInitialized
    NotInitialized {
        text: String,
    },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated {
        text: String,
    },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound {
        text: String,
    },
    /// Wrapper for argmin::PotentialBug
    PotentialBug {
        text: String,
    },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError {
        text: String,
    },
    /// Wrapper for other argmin::Error types
    BackendError {
        text: String,
    },

    // ---- Fallback ----
    UnknownError,
}

impl OptError {
    /// Attach the score trajectory recorded so far to a projection failure.
    ///
    /// Other variants are returned unchanged.
    pub fn with_trajectory(self, trajectory: &[f64]) -> Self {
        match self {
            OptError::ProjectionFailure { block, reason, .. } => {
                OptError::ProjectionFailure { block, reason, scores: trajectory.to_vec() }
            }
            other => other,
        }
    }
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Type optimization ----
            OptError::DegenerateType { iteration, value } => {
                write!(f, "Degenerate character type at iteration {iteration}: score {value}")
            }
            OptError::ProjectionFailure { block, reason, scores } => {
                write!(
                    f,
                    "Projection of block '{block}' failed after {} iterations: {reason}",
                    scores.len()
                )
            }

            // ---- TypeOptOptions ----
            OptError::InvalidLearningRate { value, reason } => {
                write!(f, "Invalid learning rate {value}: {reason}")
            }
            OptError::InvalidEps { value, reason } => {
                write!(f, "Invalid feasibility tolerance {value}: {reason}")
            }
            OptError::InvalidNIter { n_iter, reason } => {
                write!(f, "Invalid number of iterations {n_iter}: {reason}")
            }
            OptError::InvalidLogEvery { every } => {
                write!(f, "Invalid logging interval {every}: must be greater than zero")
            }

            // ---- Parameter layout ----
            OptError::InvalidLayout { block, reason } => {
                write!(f, "Invalid parameter block '{block}': {reason}")
            }
            OptError::ThetaLengthMismatch { expected, found } => {
                write!(f, "Theta length mismatch: expected {expected}, found {found}")
            }

            // ---- Gradient ----
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- Optimizer outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid final parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => {
                write!(f, "Missing final parameters (theta hat)")
            }

            // ---- Model ----
            OptError::Type(err) => {
                write!(f, "Character type error: {err}")
            }

            // ---- Argmin ----
            OptError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            OptError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            OptError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            OptError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            OptError::CheckPointNotFound { text } => {
                write!(f, "Checkpoint not found: {text}")
            }
            OptError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            OptError::ImpossibleError { text } => {
                write!(f, "Impossible error: {text}")
            }
            OptError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Fallback ----
            OptError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        // Errors raised by the adapter or solver travel through argmin untouched.
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(opt_err) => match opt_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

impl From<TypeError> for OptError {
    fn from(err: TypeError) -> Self {
        OptError::Type(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Errors raised inside argmin callbacks come back as the original
    // `OptError`, while argmin's own errors map onto their wrappers.
    fn argmin_errors_round_trip() {
        let ours: Error = OptError::DegenerateType { iteration: 3, value: f64::NEG_INFINITY }.into();
        let theirs: Error = ArgminError::NotInitialized { text: "no param".to_string() }.into();

        assert_eq!(
            OptError::from(ours),
            OptError::DegenerateType { iteration: 3, value: f64::NEG_INFINITY }
        );
        assert_eq!(
            OptError::from(theirs),
            OptError::NotInitialized { text: "no param".to_string() }
        );
    }

    #[test]
    // Purpose
    // -------
    // Only projection failures pick up the trajectory.
    fn with_trajectory_fills_projection_failure() {
        let proj = OptError::ProjectionFailure { block: "b".to_string(), reason: "r", scores: vec![] };
        let other = OptError::MissingThetaHat;

        let proj = proj.with_trajectory(&[1.0, 2.0]);

        assert_eq!(
            proj,
            OptError::ProjectionFailure { block: "b".to_string(), reason: "r", scores: vec![1.0, 2.0] }
        );
        assert_eq!(other.with_trajectory(&[1.0]), OptError::MissingThetaHat);
    }
}
