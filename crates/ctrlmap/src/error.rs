use ctrlmap_image::ImageError;

/// Error type returned by an external depth or pose estimator.
pub type EstimatorError = Box<dyn std::error::Error + Send + Sync>;

/// An error type for the control-map pipeline.
#[derive(thiserror::Error, Debug)]
pub enum ControlError {
    /// Error from an image operation.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The mode needs an estimator the pipeline was not built with.
    #[error("No {0} estimator configured")]
    MissingEstimator(&'static str),

    /// The external estimator failed.
    #[error("Estimator failed: {0}")]
    Estimator(#[source] EstimatorError),
}
