mod estimator;

pub use estimator::{MacroEstimator, OpenAiEstimator};
