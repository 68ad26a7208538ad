use crate::model::dirichlet::DirichletCategoricalModel;
use crate::model::error::DiceError;
use crate::model::novelty::{NoveltyDetector, RoleModel};

/// Per-face concentration of the fair prior: a strong belief in a uniform die.
pub const FAIR_CONCENTRATION: f64 = 20.0;
/// Per-face concentration of the cheat prior: uniform over all possible dice.
pub const CHEAT_CONCENTRATION: f64 = 1.0;

/// Face labels `1..=faces`.
pub fn die_faces(faces: u32) -> Vec<u32> {
    (1..=faces).collect()
}

/// Fair-vs-cheat detector for a die with faces labelled `1..=faces`.
pub fn standard_die(faces: u32) -> Result<NoveltyDetector<u32>, DiceError> {
    let k = faces as usize;
    NoveltyDetector::dual(
        &die_faces(faces),
        RoleModel::fair(DirichletCategoricalModel::symmetric(k, FAIR_CONCENTRATION)?),
        RoleModel::cheat(DirichletCategoricalModel::symmetric(k, CHEAT_CONCENTRATION)?),
    )
}

/// The six-sided die.
pub fn d6() -> Result<NoveltyDetector<u32>, DiceError> {
    standard_die(6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::novelty::{ModelRole, CHEAT_FILL, FAIR_FILL};

    #[test]
    fn test_d6_layout() {
        let detector = d6().unwrap();
        assert_eq!(detector.categories(), &[1, 2, 3, 4, 5, 6]);
        assert!(detector.mode().is_dual());
        assert_eq!(detector.model(ModelRole::Fair).unwrap().alpha(), &[20.0; 6]);
        assert_eq!(detector.model(ModelRole::Cheat).unwrap().alpha(), &[1.0; 6]);
    }

    #[test]
    fn test_d6_scores_one_of_each() {
        let detector = d6().unwrap();
        let faces = die_faces(6);
        let counts = detector.count_observations(&faces).unwrap();
        let fair = detector.model(ModelRole::Fair).unwrap();
        assert!((fair.marginal(&counts).unwrap() - 1.8950327390001377e-05).abs() < 1e-12);
        assert!((fair.log_marginal(&counts).unwrap() - -10.873689350067835).abs() < 1e-9);
        assert!((detector.log_bayes_factor(&faces).unwrap() - -1.8411267530240067).abs() < 1e-9);
    }

    #[test]
    fn test_d6_grows_to_d8() {
        let detector = d6().unwrap();
        let grown = detector.extend_for(&[7, 8, 1]);
        assert_eq!(grown.categories(), die_faces(8).as_slice());
        let fair = grown.model(ModelRole::Fair).unwrap();
        assert_eq!(&fair.alpha()[6..], &[FAIR_FILL, FAIR_FILL]);
        let cheat = grown.model(ModelRole::Cheat).unwrap();
        assert_eq!(&cheat.alpha()[6..], &[CHEAT_FILL, CHEAT_FILL]);
    }

    #[test]
    fn test_zero_faces_is_rejected() {
        assert!(standard_die(0).is_err());
    }
}
