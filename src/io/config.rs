use crate::model::{
    DiceError, DirichletCategoricalModel, NoveltyDetector, RoleModel, CHEAT_FILL, FAIR_FILL,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Detector description read from TOML.
///
/// ```toml
/// categories = [1, 2, 3, 4, 5, 6]
/// threshold = 10.0
///
/// [fair]
/// alpha = [20.0, 20.0, 20.0, 20.0, 20.0, 20.0]
///
/// [cheat]
/// alpha = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0]
/// ```
///
/// Without a `[cheat]` table the detector runs in single-model mode.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorConfig {
    #[serde(deserialize_with = "deserialize_labels")]
    pub categories: Vec<String>,
    pub fair: PriorConfig,
    #[serde(default)]
    pub cheat: Option<PriorConfig>,
    /// Overrides the mode's default threshold.
    #[serde(default)]
    pub threshold: Option<f64>,
}

/// Dirichlet concentration for one model role.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriorConfig {
    pub alpha: Vec<f64>,
    /// Concentration for categories added later; defaults per role.
    #[serde(default)]
    pub fill: Option<f64>,
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), DiceError> {
        let k = self.categories.len();
        let priors = std::iter::once(("fair", &self.fair))
            .chain(self.cheat.as_ref().map(|c| ("cheat", c)));
        for (role, prior) in priors {
            if prior.alpha.len() != k {
                return Err(DiceError::Config(format!(
                    "{} alpha has {} entries but there are {} categories",
                    role,
                    prior.alpha.len(),
                    k
                )));
            }
        }
        Ok(())
    }

    pub fn is_dual(&self) -> bool {
        self.cheat.is_some()
    }

    /// Build the detector this configuration describes.
    pub fn build_detector(&self) -> Result<NoveltyDetector<String>, DiceError> {
        self.validate()?;
        let fair = role_model(&self.fair, FAIR_FILL)?;
        let detector = match &self.cheat {
            Some(cheat) => {
                NoveltyDetector::dual(&self.categories, fair, role_model(cheat, CHEAT_FILL)?)?
            }
            None => NoveltyDetector::single(&self.categories, fair)?,
        };
        match self.threshold {
            Some(threshold) => detector.with_default_threshold(threshold),
            None => Ok(detector),
        }
    }
}

fn role_model(prior: &PriorConfig, default_fill: f64) -> Result<RoleModel, DiceError> {
    let model = DirichletCategoricalModel::new(prior.alpha.clone())?;
    RoleModel::new(model, prior.fill.unwrap_or(default_fill))
}

/// Category labels may be written as TOML strings or integers.
fn deserialize_labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawLabel {
        Int(i64),
        Text(String),
    }

    let raw = Vec::<RawLabel>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|label| match label {
            RawLabel::Int(v) => v.to_string(),
            RawLabel::Text(s) => s,
        })
        .collect())
}

/// Load and validate a detector configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<DetectorConfig, DiceError> {
    let contents = std::fs::read_to_string(path)?;
    let config: DetectorConfig = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelRole, NoveltyMode};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DUAL: &str = r#"
categories = [1, 2, 3, 4, 5, 6]

[fair]
alpha = [20.0, 20.0, 20.0, 20.0, 20.0, 20.0]

[cheat]
alpha = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0]
fill = 0.5
"#;

    #[test]
    fn test_load_dual_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(DUAL.as_bytes()).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.categories, vec!["1", "2", "3", "4", "5", "6"]);
        assert!(config.is_dual());

        let detector = config.build_detector().unwrap();
        match detector.mode() {
            NoveltyMode::DualModel {
                fair,
                cheat,
                default_threshold,
            } => {
                assert_eq!(fair.fill, FAIR_FILL);
                assert_eq!(cheat.fill, 0.5);
                assert_eq!(*default_threshold, 10.0);
            }
            other => panic!("unexpected mode {other:?}"),
        }
    }

    #[test]
    fn test_single_mode_with_threshold() {
        let config: DetectorConfig = toml::from_str(
            r#"
categories = ["heads", "tails"]
threshold = 0.05

[fair]
alpha = [5.0, 5.0]
"#,
        )
        .unwrap();
        let detector = config.build_detector().unwrap();
        assert!(!detector.mode().is_dual());
        assert_eq!(detector.mode().default_threshold(), 0.05);
        assert!(detector.model(ModelRole::Cheat).is_err());
    }

    #[test]
    fn test_alpha_length_mismatch() {
        let config: DetectorConfig = toml::from_str(
            r#"
categories = ["a", "b", "c"]

[fair]
alpha = [1.0, 1.0]
"#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(DiceError::Config(_))));
        assert!(config.build_detector().is_err());
    }

    #[test]
    fn test_zero_cheat_fill_is_rejected() {
        let config: DetectorConfig = toml::from_str(
            r#"
categories = ["a", "b"]

[fair]
alpha = [2.0, 2.0]
fill = 0.0

[cheat]
alpha = [1.0, 1.0]
fill = 0.0
"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.build_detector(),
            Err(DiceError::InvalidFill { .. })
        ));
    }

    #[test]
    fn test_invalid_alpha_and_fill() {
        let zero_alpha: DetectorConfig = toml::from_str(
            r#"
categories = ["a", "b"]

[fair]
alpha = [1.0, 0.0]
"#,
        )
        .unwrap();
        assert!(matches!(
            zero_alpha.build_detector(),
            Err(DiceError::InvalidAlpha { index: 1, .. })
        ));

        let negative_fill: DetectorConfig = toml::from_str(
            r#"
categories = ["a", "b"]

[fair]
alpha = [1.0, 1.0]
fill = -2.0
"#,
        )
        .unwrap();
        assert!(matches!(
            negative_fill.build_detector(),
            Err(DiceError::InvalidFill { .. })
        ));
    }
}
