//! User-supplied transfer curve.

use serde::{Deserialize, Serialize};

use super::active::Transfer;
use crate::measurement::ResponseData;

/// Multiplies the children's response by a measured curve, read as dB
/// gain and phase. Impedance passes through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomResponse {
    pub data: ResponseData,
}

impl CustomResponse {
    pub fn new(data: ResponseData) -> Self {
        Self { data }
    }

    pub fn compile(&self) -> Transfer {
        Transfer::Measured(self.data.clone())
    }
}
