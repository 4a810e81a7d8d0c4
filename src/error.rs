use thiserror::Error;

use crate::inventory::InventoryError;
use crate::scoring::Weights;
use crate::upload::UploadError;

/// Upper bound on asset types per run, to bound load on the inventory API.
pub const MAX_ASSET_TYPES: usize = 5;

#[derive(Debug, Error)]
pub enum CriticalityError {
    #[error("missing configuration key: {0}")]
    MissingConfig(String),

    #[error("unable to create an inventory client: {0}")]
    Client(#[from] InventoryError),

    #[error(
        "invalid weights provided. please provide weights between 0 and 10. provided weights: {}",
        describe_weights(.0)
    )]
    InvalidWeights(Option<Weights>),

    #[error("no assets specified")]
    NoAssetTypes,

    #[error(
        "more than {max} assets specified ({0}), please reduce the number of assets to acquire data for",
        max = MAX_ASSET_TYPES
    )]
    TooManyAssetTypes(usize),

    #[error("worker pool returned {received} of {expected} asset type results")]
    MissingResults { expected: usize, received: usize },

    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),
}

impl CriticalityError {
    /// Validation stops end the run without signalling failure to the shell.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CriticalityError::InvalidWeights(_)
                | CriticalityError::NoAssetTypes
                | CriticalityError::TooManyAssetTypes(_)
        )
    }
}

fn describe_weights(weights: &Option<Weights>) -> String {
    match weights {
        Some(w) => format!("ageInDays={}, dependencies={}", w.age_in_days, w.dependencies),
        None => "none".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_many_assets_display() {
        let err = CriticalityError::TooManyAssetTypes(7);
        assert_eq!(
            err.to_string(),
            "more than 5 assets specified (7), please reduce the number of assets to acquire data for"
        );
    }

    #[test]
    fn invalid_weights_display_names_values() {
        let err = CriticalityError::InvalidWeights(Some(Weights {
            age_in_days: 11,
            dependencies: 3,
        }));
        assert!(err.to_string().ends_with("ageInDays=11, dependencies=3"));

        let err = CriticalityError::InvalidWeights(None);
        assert!(err.to_string().ends_with("provided weights: none"));
    }

    #[test]
    fn validation_classification() {
        assert!(CriticalityError::NoAssetTypes.is_validation());
        assert!(CriticalityError::TooManyAssetTypes(6).is_validation());
        assert!(CriticalityError::InvalidWeights(None).is_validation());
        assert!(!CriticalityError::MissingConfig("J1_REGION".into()).is_validation());
        assert!(
            !CriticalityError::MissingResults {
                expected: 2,
                received: 1
            }
            .is_validation()
        );
    }
}
