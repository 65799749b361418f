//! Inference engine modules.

pub mod grid;
pub mod likelihood;
pub mod posterior;
pub mod prior;
pub mod summary;

pub use grid::{GridBounds, GridPoint};
pub use likelihood::{
    log_likelihood, log_likelihood_stopped, FixedSampleLikelihood, LikelihoodFn, LikelihoodModel,
    LogLikelihood, StoppingTimeLikelihood,
};
pub use posterior::{
    grid_posterior, grid_posterior_with, Diagnostic, PosteriorError, PosteriorOptions,
    PosteriorRecord, PosteriorTable,
};
pub use prior::{
    BaathPrior, FactoredPrior, FlatPrior, LogPrior, PriorFn, PriorModel, Propriety,
    DEFAULT_FLAT_LOG_VALUE,
};
pub use summary::{MarginalEntry, ModeSummary, PosteriorSummary};
