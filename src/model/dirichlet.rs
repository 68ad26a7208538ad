use crate::model::error::DiceError;
use statrs::function::gamma::{gamma, ln_gamma};
use tracing::warn;

/// K-way categorical distribution with a Dirichlet prior.
///
/// The concentration vector is fixed at construction. Updated beliefs are
/// expressed as new models, never by mutating `alpha`.
#[derive(Debug, Clone, PartialEq)]
pub struct DirichletCategoricalModel {
    alpha: Vec<f64>,
    alpha_sum: f64,
}

impl DirichletCategoricalModel {
    /// Build a prior from concentration parameters; each must be finite and > 0.
    pub fn new(alpha: Vec<f64>) -> Result<Self, DiceError> {
        if alpha.is_empty() {
            return Err(DiceError::Shape("alpha must have at least one entry".into()));
        }
        if let Some((index, &value)) = alpha
            .iter()
            .enumerate()
            .find(|(_, a)| !a.is_finite() || **a <= 0.0)
        {
            return Err(DiceError::InvalidAlpha { index, value });
        }
        Ok(Self::from_parts(alpha))
    }

    /// Symmetric prior with the same concentration for each of `k` categories.
    pub fn symmetric(k: usize, concentration: f64) -> Result<Self, DiceError> {
        Self::new(vec![concentration; k])
    }

    fn from_parts(alpha: Vec<f64>) -> Self {
        let alpha_sum = alpha.iter().sum();
        Self { alpha, alpha_sum }
    }

    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    pub fn alpha_sum(&self) -> f64 {
        self.alpha_sum
    }

    /// Number of categories K.
    pub fn len(&self) -> usize {
        self.alpha.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }

    /// True when some `alpha_k <= 1`, i.e. the MAP formula has no interior mode.
    pub fn is_degenerate(&self) -> bool {
        self.alpha.iter().any(|&a| a <= 1.0)
    }

    /// New model covering `n_new` additional categories, each with concentration `fill`.
    ///
    /// A fill of exactly 0 marks the new categories as structural zeros: the
    /// model puts no prior mass on them.
    pub fn extended(&self, n_new: usize, fill: f64) -> Result<Self, DiceError> {
        validate_fill(fill)?;
        Ok(self.append(n_new, fill))
    }

    pub(crate) fn append(&self, n_new: usize, fill: f64) -> Self {
        let alpha = self
            .alpha
            .iter()
            .copied()
            .chain(std::iter::repeat(fill).take(n_new))
            .collect();
        Self::from_parts(alpha)
    }

    /// Dirichlet-Categorical marginal likelihood of a count vector.
    ///
    /// `Γ(A)/Γ(n+A) · Π_k Γ(c_k+α_k)/Γ(α_k)`. Gamma overflows once `n + A`
    /// reaches the low hundreds; use [`Self::log_marginal`] for real data.
    pub fn marginal(&self, counts: &[u64]) -> Result<f64, DiceError> {
        self.check_counts(counts)?;
        let n = total(counts);
        let reg = gamma(self.alpha_sum) / gamma(n + self.alpha_sum);
        let product: f64 = counts
            .iter()
            .zip(&self.alpha)
            .map(|(&c, &a)| {
                if a == 0.0 {
                    if c == 0 { 1.0 } else { 0.0 }
                } else {
                    gamma(c as f64 + a) / gamma(a)
                }
            })
            .product();
        Ok(reg * product)
    }

    /// Same quantity as [`Self::marginal`], named for the "likelihood of data given prior" reading.
    pub fn likelihood(&self, counts: &[u64]) -> Result<f64, DiceError> {
        self.marginal(counts)
    }

    /// Log of the marginal likelihood computed with log-gamma.
    pub fn log_marginal(&self, counts: &[u64]) -> Result<f64, DiceError> {
        self.check_counts(counts)?;
        let n = total(counts);
        let reg = ln_gamma(self.alpha_sum) - ln_gamma(n + self.alpha_sum);
        let terms: f64 = counts
            .iter()
            .zip(&self.alpha)
            .map(|(&c, &a)| {
                if a == 0.0 {
                    if c == 0 { 0.0 } else { f64::NEG_INFINITY }
                } else {
                    ln_gamma(c as f64 + a) - ln_gamma(a)
                }
            })
            .sum();
        Ok(reg + terms)
    }

    /// MAP estimate of the categorical parameters:
    /// `(c_k + α_k - 1) / (n + Σ(α_k - 1))`.
    ///
    /// When some `α_k <= 1` the value is still returned as computed but is not
    /// an interior mode and may fall outside the probability simplex.
    pub fn map(&self, counts: &[u64]) -> Result<Vec<f64>, DiceError> {
        self.check_counts(counts)?;
        if self.is_degenerate() {
            warn!(
                alpha = ?self.alpha,
                "MAP requested with alpha <= 1; result is not an interior mode"
            );
        }
        let n = total(counts);
        let prior_exponent: f64 = self.alpha.iter().map(|a| a - 1.0).sum();
        let denom = n + prior_exponent;
        Ok(counts
            .iter()
            .zip(&self.alpha)
            .map(|(&c, &a)| (c as f64 + a - 1.0) / denom)
            .collect())
    }

    fn check_counts(&self, counts: &[u64]) -> Result<(), DiceError> {
        if counts.len() != self.alpha.len() {
            return Err(DiceError::Shape(format!(
                "count vector has {} categories, model has {}",
                counts.len(),
                self.alpha.len()
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_fill(fill: f64) -> Result<(), DiceError> {
    if !fill.is_finite() || fill < 0.0 {
        return Err(DiceError::InvalidFill { value: fill });
    }
    Ok(())
}

fn total(counts: &[u64]) -> f64 {
    counts.iter().sum::<u64>() as f64
}
