use crate::core::battery::simulator::SimulatorError;
use crate::core::thermal_balance::SizingNotAchieved;
use crate::read_reference_data::{
    ReferenceDataLoadError, ReferenceDataLookupError, ReferenceDataMissing,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BessThermalError {
    #[error("Request was considered invalid due to error: {0}")]
    InvalidRequest(#[from] anyhow::Error),
    #[error("Reference data could not be loaded: {0}")]
    ReferenceDataUnreadable(#[from] ReferenceDataLoadError),
    #[error("{0}")]
    ReferenceDataMissing(#[from] ReferenceDataMissing),
    #[error("Reference data is invalid: {0}")]
    ReferenceDataInvalid(ReferenceDataLookupError),
    #[error("Battery heat generation could not be simulated: {0}")]
    SimulatorDivergence(#[from] SimulatorError),
    #[error("{0}")]
    SizingNotAchieved(#[from] SizingNotAchieved),
    #[error("Error writing results: {0}")]
    ErrorInOutput(OutputError),
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct OutputError {
    error: anyhow::Error,
}

impl OutputError {
    pub(crate) fn new(error: anyhow::Error) -> Self {
        Self { error }
    }
}

impl From<ReferenceDataLookupError> for BessThermalError {
    fn from(error: ReferenceDataLookupError) -> Self {
        match error {
            ReferenceDataLookupError::Missing(missing) => {
                BessThermalError::ReferenceDataMissing(missing)
            }
            invalid => BessThermalError::ReferenceDataInvalid(invalid),
        }
    }
}

impl From<OutputError> for BessThermalError {
    fn from(error: OutputError) -> Self {
        BessThermalError::ErrorInOutput(error)
    }
}
