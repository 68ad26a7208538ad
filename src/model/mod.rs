pub mod dirichlet;
pub mod encoder;
pub mod error;
pub mod novelty;
pub mod presets;

pub use dirichlet::DirichletCategoricalModel;
pub use encoder::{CategoryEncoder, Label};
pub use error::DiceError;
pub use novelty::{
    Assessment, ModelRole, NoveltyDetector, NoveltyMode, RoleModel, CHEAT_FILL,
    DEFAULT_BAYES_FACTOR_THRESHOLD, DEFAULT_LIKELIHOOD_THRESHOLD, FAIR_FILL,
};
