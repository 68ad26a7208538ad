pub mod cli;
pub mod commands;
pub mod io;
pub mod model;

pub use commands::run;
pub use model::{
    CategoryEncoder, DiceError, DirichletCategoricalModel, ModelRole, NoveltyDetector,
    NoveltyMode, RoleModel,
};
