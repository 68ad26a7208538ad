use crate::model::dirichlet::{validate_fill, DirichletCategoricalModel};
use crate::model::encoder::{CategoryEncoder, Label};
use crate::model::error::DiceError;
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::debug;

/// Bayes factor (cheat over fair) above which a batch is flagged in dual-model mode.
pub const DEFAULT_BAYES_FACTOR_THRESHOLD: f64 = 10.0;
/// Raw likelihood below which a batch is flagged in single-model mode.
pub const DEFAULT_LIKELIHOOD_THRESHOLD: f64 = 0.1;
/// Concentration given to newly seen categories in the fair model.
pub const FAIR_FILL: f64 = 0.0;
/// Concentration given to newly seen categories in the cheat model.
pub const CHEAT_FILL: f64 = 1.0;

/// Which model of a detector an operation should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    /// The fair model, or the sole reference model in single-model mode.
    Fair,
    Cheat,
}

impl ModelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::Fair => "fair",
            ModelRole::Cheat => "cheat",
        }
    }
}

/// A model together with the concentration assigned to categories added later.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleModel {
    pub model: DirichletCategoricalModel,
    pub fill: f64,
}

impl RoleModel {
    pub fn new(model: DirichletCategoricalModel, fill: f64) -> Result<Self, DiceError> {
        validate_fill(fill)?;
        Ok(Self { model, fill })
    }

    pub fn fair(model: DirichletCategoricalModel) -> Self {
        Self {
            model,
            fill: FAIR_FILL,
        }
    }

    pub fn cheat(model: DirichletCategoricalModel) -> Self {
        Self {
            model,
            fill: CHEAT_FILL,
        }
    }

    fn extended(&self, n_new: usize) -> Self {
        Self {
            model: self.model.append(n_new, self.fill),
            fill: self.fill,
        }
    }
}

/// Detector topology, chosen once at construction.
///
/// The two modes use independent decision rules:
/// - `SingleModel`: novel iff `likelihood(counts) < threshold` (default 0.1),
///   evaluated as `log_marginal(counts) < ln(threshold)` so large batches do
///   not overflow.
/// - `DualModel`: novel iff `log_bayes_factor(obs) > ln(threshold)` (default 10).
#[derive(Debug, Clone, PartialEq)]
pub enum NoveltyMode {
    SingleModel {
        reference: RoleModel,
        default_threshold: f64,
    },
    DualModel {
        fair: RoleModel,
        cheat: RoleModel,
        default_threshold: f64,
    },
}

impl NoveltyMode {
    pub fn single(reference: RoleModel) -> Self {
        NoveltyMode::SingleModel {
            reference,
            default_threshold: DEFAULT_LIKELIHOOD_THRESHOLD,
        }
    }

    pub fn dual(fair: RoleModel, cheat: RoleModel) -> Self {
        NoveltyMode::DualModel {
            fair,
            cheat,
            default_threshold: DEFAULT_BAYES_FACTOR_THRESHOLD,
        }
    }

    pub fn is_dual(&self) -> bool {
        matches!(self, NoveltyMode::DualModel { .. })
    }

    pub fn default_threshold(&self) -> f64 {
        match self {
            NoveltyMode::SingleModel {
                default_threshold, ..
            }
            | NoveltyMode::DualModel {
                default_threshold, ..
            } => *default_threshold,
        }
    }

    fn role_models(&self) -> Vec<&RoleModel> {
        match self {
            NoveltyMode::SingleModel { reference, .. } => vec![reference],
            NoveltyMode::DualModel { fair, cheat, .. } => vec![fair, cheat],
        }
    }

    fn extended(&self, n_new: usize) -> Self {
        match self {
            NoveltyMode::SingleModel {
                reference,
                default_threshold,
            } => NoveltyMode::SingleModel {
                reference: reference.extended(n_new),
                default_threshold: *default_threshold,
            },
            NoveltyMode::DualModel {
                fair,
                cheat,
                default_threshold,
            } => NoveltyMode::DualModel {
                fair: fair.extended(n_new),
                cheat: cheat.extended(n_new),
                default_threshold: *default_threshold,
            },
        }
    }
}

/// Everything a driver needs to report about one scored batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment<T: Label> {
    pub counts: Vec<u64>,
    pub log_marginal_fair: f64,
    /// Present in dual-model mode only.
    pub log_marginal_cheat: Option<f64>,
    /// Present in dual-model mode only.
    pub log_bayes_factor: Option<f64>,
    /// Present in single-model mode only.
    pub likelihood: Option<f64>,
    pub novel: bool,
    pub map: Vec<(T, f64)>,
}

impl<T: Label> Assessment<T> {
    pub fn n(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Decides whether die observations still look like they come from the fair process.
#[derive(Debug, Clone)]
pub struct NoveltyDetector<T: Label> {
    encoder: CategoryEncoder<T>,
    mode: NoveltyMode,
}

impl<T: Label> NoveltyDetector<T> {
    pub fn new(categories: &[T], mode: NoveltyMode) -> Result<Self, DiceError> {
        let encoder = CategoryEncoder::fit(categories)?;
        for role in mode.role_models() {
            if role.model.len() != encoder.len() {
                return Err(DiceError::Shape(format!(
                    "model has {} alpha entries but there are {} categories",
                    role.model.len(),
                    encoder.len()
                )));
            }
            validate_fill(role.fill)?;
        }
        // a zero-fill cheat model scores a new face at -inf like the fair one,
        // leaving the Bayes factor undefined
        if let NoveltyMode::DualModel { cheat, .. } = &mode {
            if cheat.fill == 0.0 {
                return Err(DiceError::InvalidFill { value: cheat.fill });
            }
        }
        Ok(Self { encoder, mode })
    }

    /// Likelihood-threshold detector against a single reference model.
    pub fn single(categories: &[T], reference: RoleModel) -> Result<Self, DiceError> {
        Self::new(categories, NoveltyMode::single(reference))
    }

    /// Bayes-factor detector comparing a fair and a cheat model.
    pub fn dual(categories: &[T], fair: RoleModel, cheat: RoleModel) -> Result<Self, DiceError> {
        Self::new(categories, NoveltyMode::dual(fair, cheat))
    }

    /// Replace the mode's default threshold.
    pub fn with_default_threshold(mut self, threshold: f64) -> Result<Self, DiceError> {
        validate_threshold(threshold)?;
        match &mut self.mode {
            NoveltyMode::SingleModel {
                default_threshold, ..
            }
            | NoveltyMode::DualModel {
                default_threshold, ..
            } => *default_threshold = threshold,
        }
        Ok(self)
    }

    pub fn categories(&self) -> &[T] {
        self.encoder.categories()
    }

    pub fn mode(&self) -> &NoveltyMode {
        &self.mode
    }

    pub fn encoder(&self) -> &CategoryEncoder<T> {
        &self.encoder
    }

    /// Model used for `role`. `Cheat` has no model in single-model mode.
    pub fn model(&self, role: ModelRole) -> Result<&DirichletCategoricalModel, DiceError> {
        match (&self.mode, role) {
            (NoveltyMode::SingleModel { reference, .. }, ModelRole::Fair) => Ok(&reference.model),
            (NoveltyMode::SingleModel { .. }, ModelRole::Cheat) => Err(DiceError::UnsupportedMode(
                "single-model detector has no cheat model".into(),
            )),
            (NoveltyMode::DualModel { fair, .. }, ModelRole::Fair) => Ok(&fair.model),
            (NoveltyMode::DualModel { cheat, .. }, ModelRole::Cheat) => Ok(&cheat.model),
        }
    }

    /// Per-category counts of a batch; fails on any unknown label.
    pub fn count_observations(&self, observations: &[T]) -> Result<Vec<u64>, DiceError> {
        self.encoder.count(observations)
    }

    /// Log marginal likelihood of a batch under the model for `role`.
    pub fn log_marginal(&self, observations: &[T], role: ModelRole) -> Result<f64, DiceError> {
        let model = self.model(role)?;
        model.log_marginal(&self.count_observations(observations)?)
    }

    /// Raw marginal likelihood of a batch under the fair/reference model.
    pub fn likelihood(&self, observations: &[T]) -> Result<f64, DiceError> {
        let model = self.model(ModelRole::Fair)?;
        model.likelihood(&self.count_observations(observations)?)
    }

    /// `log_marginal_cheat - log_marginal_fair`. Positive values favour the
    /// cheat model, negative values the fair one. Dual-model mode only.
    pub fn log_bayes_factor(&self, observations: &[T]) -> Result<f64, DiceError> {
        let (fair, cheat) = self.dual_models()?;
        let counts = self.count_observations(observations)?;
        Ok(cheat.log_marginal(&counts)? - fair.log_marginal(&counts)?)
    }

    pub fn bayes_factor(&self, observations: &[T]) -> Result<f64, DiceError> {
        Ok(self.log_bayes_factor(observations)?.exp())
    }

    /// Apply the mode's decision rule. `None` uses the mode's default threshold.
    pub fn is_novel(&self, observations: &[T], threshold: Option<f64>) -> Result<bool, DiceError> {
        let threshold = self.resolve_threshold(threshold)?;
        match &self.mode {
            NoveltyMode::DualModel { .. } => {
                Ok(self.log_bayes_factor(observations)? > threshold.ln())
            }
            NoveltyMode::SingleModel { .. } => {
                Ok(self.log_marginal(observations, ModelRole::Fair)? < threshold.ln())
            }
        }
    }

    /// MAP estimate from the chosen model, paired with the categories in the same order.
    pub fn map_distribution(
        &self,
        observations: &[T],
        role: ModelRole,
    ) -> Result<(Vec<T>, Vec<f64>), DiceError> {
        let model = self.model(role)?;
        let map = model.map(&self.count_observations(observations)?)?;
        Ok((self.categories().to_vec(), map))
    }

    /// Whether every label is a known category. Only the unknown-category
    /// failure becomes `false`; anything else is passed through.
    pub fn is_valid_observations(&self, observations: &[T]) -> Result<bool, DiceError> {
        match self.encoder.transform(observations) {
            Ok(_) => Ok(true),
            Err(DiceError::UnknownCategory { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Labels outside the category set, deduplicated, in first-seen order.
    pub fn unseen_labels(&self, observations: &[T]) -> Vec<T> {
        let mut seen = HashSet::new();
        observations
            .iter()
            .filter(|label| !self.encoder.contains(label))
            .filter(|label| seen.insert(*label))
            .cloned()
            .collect()
    }

    /// Detector that also covers every label in `observations`.
    ///
    /// Returns `self` unchanged when nothing is new. Otherwise the new labels
    /// are appended to the category set and every model's alpha is extended
    /// with that model's fill value; `self` is left as it was.
    pub fn extend_for(&self, observations: &[T]) -> Cow<'_, Self> {
        let unseen = self.unseen_labels(observations);
        if unseen.is_empty() {
            return Cow::Borrowed(self);
        }
        debug!(new = ?unseen, known = self.encoder.len(), "extending category set");
        // fills were validated at construction
        let mode = self.mode.extended(unseen.len());
        let encoder = self.encoder.appended(&unseen);
        Cow::Owned(Self { encoder, mode })
    }

    /// Score one batch with every quantity the active mode supports.
    pub fn assess(
        &self,
        observations: &[T],
        threshold: Option<f64>,
        map_role: ModelRole,
    ) -> Result<Assessment<T>, DiceError> {
        let threshold = self.resolve_threshold(threshold)?;
        let counts = self.count_observations(observations)?;
        let fair = self.model(ModelRole::Fair)?;
        let log_marginal_fair = fair.log_marginal(&counts)?;
        let (log_marginal_cheat, log_bayes_factor, likelihood, novel) = match &self.mode {
            NoveltyMode::DualModel { cheat, .. } => {
                let log_cheat = cheat.model.log_marginal(&counts)?;
                let lbf = log_cheat - log_marginal_fair;
                (Some(log_cheat), Some(lbf), None, lbf > threshold.ln())
            }
            NoveltyMode::SingleModel { .. } => {
                // exp of the log form underflows to 0 instead of overflowing to NaN
                let likelihood = log_marginal_fair.exp();
                (
                    None,
                    None,
                    Some(likelihood),
                    log_marginal_fair < threshold.ln(),
                )
            }
        };
        let map = self
            .model(map_role)?
            .map(&counts)?
            .into_iter()
            .zip(self.categories().iter().cloned())
            .map(|(p, label)| (label, p))
            .collect();
        Ok(Assessment {
            counts,
            log_marginal_fair,
            log_marginal_cheat,
            log_bayes_factor,
            likelihood,
            novel,
            map,
        })
    }

    fn dual_models(
        &self,
    ) -> Result<(&DirichletCategoricalModel, &DirichletCategoricalModel), DiceError> {
        match &self.mode {
            NoveltyMode::DualModel { fair, cheat, .. } => Ok((&fair.model, &cheat.model)),
            NoveltyMode::SingleModel { .. } => Err(DiceError::UnsupportedMode(
                "Bayes factor requires a fair and a cheat model".into(),
            )),
        }
    }

    fn resolve_threshold(&self, threshold: Option<f64>) -> Result<f64, DiceError> {
        let threshold = threshold.unwrap_or_else(|| self.mode.default_threshold());
        validate_threshold(threshold)?;
        Ok(threshold)
    }
}

fn validate_threshold(threshold: f64) -> Result<(), DiceError> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(DiceError::InvalidThreshold { value: threshold });
    }
    Ok(())
}
