//! Library error types.

use thiserror::Error;

/// Registry and wiring failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("Compartment '{0}' is already registered")]
    DuplicateCompartment(String),

    #[error("Compartment '{0}' is not registered")]
    UnknownCompartment(String),
}

/// Reasons an `activate()` request was refused
///
/// A refused activation never changes any compartment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActivationError {
    #[error("Transporter '{0}' is inert")]
    Inert(String),

    #[error("{kind} transporters have no activation step")]
    NotSupported { kind: String },

    #[error("Activation requires state {expected}, transporter is in {actual}")]
    WrongState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Insufficient ATP: {available:.3e} available, {required:.3e} required")]
    InsufficientAtp { available: f64, required: f64 },

    #[error("No transporter with id '{0}'")]
    UnknownTransporter(String),
}
