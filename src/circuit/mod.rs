//! Element tree representation and validation.
//!
//! This module provides the configuration side of a loudspeaker system.
//! An [`Element`] tree is built in code or from [`ElementRecord`]s, checked
//! with [`validate_circuit`] and compiled into a [`Simulator`].
//!
//! [`Simulator`]: crate::solver::Simulator

mod record;
mod tree;
mod types;
mod validate;

pub use record::{ElementRecord, Library};
pub use tree::{Circuit, Element, ElementKind};
pub use types::*;
pub use validate::validate_circuit;
