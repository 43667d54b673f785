use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::models::alert::AlertScope;
use crate::models::feature::Feature;
use crate::models::range::Strand;

///
/// A curated reference model: homology profile id, coordinate-space length
/// and its declared feature map. Loaded once per run, read-only and shared
/// across workers. Construction validates every declaration; a malformed
/// model aborts loading rather than being tolerated.
///
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub length: u64,
    pub features: Vec<Feature>,
}

/// A feature slot as the selector sees it: either a plain feature or a group
/// of competing definitions of the same biological entity, in declaration
/// order.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum FeatureDefinition {
    Single(usize),
    Alternative(Vec<usize>),
}

impl Model {
    pub fn new(id: String, length: u64, features: Vec<Feature>) -> Result<Self, ModelError> {
        let model = Model {
            id,
            length,
            features,
        };
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelError> {
        let mut set_members: BTreeMap<&str, Vec<usize>> = BTreeMap::new();

        for (idx, feature) in self.features.iter().enumerate() {
            if feature.coords.is_empty() {
                return Err(ModelError::EmptyFeature(idx));
            }
            for (seg, range) in feature.coords.iter().enumerate() {
                if range.lo() < 1 || range.hi() > self.length {
                    return Err(ModelError::SegmentOutOfBounds {
                        feature: idx,
                        segment: seg,
                        range: range.to_string(),
                        length: self.length,
                    });
                }
                let descending = range.start > range.end;
                let bad = match range.strand {
                    Strand::Plus => descending,
                    Strand::Minus => range.start < range.end,
                };
                if bad {
                    return Err(ModelError::SegmentStrandMismatch {
                        feature: idx,
                        segment: seg,
                        range: range.to_string(),
                    });
                }
            }
            match feature.parent {
                Some(p) if p == idx => return Err(ModelError::SelfParent(idx)),
                Some(p) if p >= self.features.len() => {
                    return Err(ModelError::UnknownParent(idx, p));
                }
                _ => {}
            }
            if let Some(set) = &feature.alternative_set {
                if feature.follows.is_some() {
                    return Err(ModelError::FollowerInAlternativeSet(idx));
                }
                set_members.entry(set).or_default().push(idx);
            }
            for exc in &feature.exceptions {
                if exc.window.lo() < 1 || exc.window.hi() > self.length {
                    return Err(ModelError::ExceptionWindowOutOfBounds {
                        feature: idx,
                        window: exc.window.to_string(),
                        length: self.length,
                    });
                }
                if exc.code.scope() == AlertScope::Sequence {
                    return Err(ModelError::ExceptionScopeMismatch(
                        idx,
                        exc.code.code().to_string(),
                    ));
                }
            }
        }

        for (set, members) in &set_members {
            if members.len() < 2 {
                return Err(ModelError::LonelyAlternative(set.to_string(), members[0]));
            }
        }

        let set_ids: HashSet<&str> = set_members.keys().copied().collect();
        for (idx, feature) in self.features.iter().enumerate() {
            if let Some(target) = &feature.follows {
                if !set_ids.contains(target.as_str()) {
                    return Err(ModelError::UnknownFollowTarget(idx, target.clone()));
                }
            }
        }

        Ok(())
    }

    /// Group features into selector slots: alternative-set members collapse
    /// into one `Alternative` slot at the position of their first member.
    pub fn definitions(&self) -> Vec<FeatureDefinition> {
        let mut defs = vec![];
        let mut seen_sets: HashSet<&str> = HashSet::new();
        for (idx, feature) in self.features.iter().enumerate() {
            match &feature.alternative_set {
                None => defs.push(FeatureDefinition::Single(idx)),
                Some(set) => {
                    if seen_sets.insert(set) {
                        let members = self
                            .features
                            .iter()
                            .enumerate()
                            .filter(|(_, f)| f.alternative_set.as_deref() == Some(set))
                            .map(|(i, _)| i)
                            .collect();
                        defs.push(FeatureDefinition::Alternative(members));
                    }
                }
            }
        }
        defs
    }

    /// Indexes of features declaring `parent == idx`, in declaration order.
    pub fn children_of(&self, idx: usize) -> Vec<usize> {
        self.features
            .iter()
            .enumerate()
            .filter(|(_, f)| f.parent == Some(idx))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn feature(&self, idx: usize) -> &Feature {
        &self.features[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::models::alert::AlertCode;
    use crate::models::feature::{AlertException, FeatureType};
    use crate::models::range::SeqRange;

    fn cds(start: u64, end: u64) -> Feature {
        Feature::new(FeatureType::Cds, vec![SeqRange::forward(start, end)])
    }

    #[rstest]
    fn test_valid_model() {
        let model = Model::new("NC_TEST".into(), 1000, vec![cds(1, 99), cds(200, 400)]);
        assert!(model.is_ok());
    }

    #[rstest]
    fn test_segment_out_of_bounds() {
        let err = Model::new("m".into(), 100, vec![cds(50, 150)]).unwrap_err();
        assert!(matches!(err, ModelError::SegmentOutOfBounds { .. }));
    }

    #[rstest]
    fn test_lonely_alternative_rejected() {
        let mut f = cds(1, 99);
        f.alternative_set = Some("orf1".into());
        let err = Model::new("m".into(), 100, vec![f]).unwrap_err();
        assert!(matches!(err, ModelError::LonelyAlternative(_, 0)));
    }

    #[rstest]
    fn test_unknown_parent_rejected() {
        let mut pep = Feature::new(FeatureType::MatPeptide, vec![SeqRange::forward(1, 30)]);
        pep.parent = Some(7);
        let err = Model::new("m".into(), 100, vec![pep]).unwrap_err();
        assert!(matches!(err, ModelError::UnknownParent(0, 7)));
    }

    #[rstest]
    fn test_exception_window_out_of_bounds() {
        let mut f = cds(1, 99);
        f.exceptions.push(AlertException {
            code: AlertCode::Deletinn,
            window: SeqRange::forward(90, 120),
            max_magnitude: 10,
        });
        let err = Model::new("m".into(), 100, vec![f]).unwrap_err();
        assert!(matches!(err, ModelError::ExceptionWindowOutOfBounds { .. }));
    }

    #[rstest]
    fn test_sequence_scoped_exception_rejected() {
        let mut f = cds(1, 99);
        f.exceptions.push(AlertException {
            code: AlertCode::Lowcovrg,
            window: SeqRange::forward(1, 99),
            max_magnitude: 10,
        });
        let err = Model::new("m".into(), 100, vec![f]).unwrap_err();
        assert!(matches!(err, ModelError::ExceptionScopeMismatch(0, _)));
    }

    #[rstest]
    fn test_unknown_follow_target_rejected() {
        let mut gene = Feature::new(FeatureType::Gene, vec![SeqRange::forward(1, 99)]);
        gene.follows = Some("orf9".into());
        let err = Model::new("m".into(), 100, vec![gene]).unwrap_err();
        assert!(matches!(err, ModelError::UnknownFollowTarget(0, _)));
    }

    #[rstest]
    fn test_definitions_group_alternatives() {
        let mut a = cds(1, 50);
        a.alternative_set = Some("orf1".into());
        let mut b = cds(1, 60);
        b.alternative_set = Some("orf1".into());
        let c = cds(70, 99);
        let model = Model::new("m".into(), 100, vec![a, c, b]).unwrap();
        let defs = model.definitions();
        assert_eq!(
            defs,
            vec![
                FeatureDefinition::Alternative(vec![0, 2]),
                FeatureDefinition::Single(1),
            ]
        );
    }

    #[rstest]
    fn test_children_of() {
        let parent = cds(1, 90);
        let mut pep = Feature::new(FeatureType::MatPeptide, vec![SeqRange::forward(1, 30)]);
        pep.parent = Some(0);
        let model = Model::new("m".into(), 100, vec![parent, pep]).unwrap();
        assert_eq!(model.children_of(0), vec![1]);
        assert_eq!(model.children_of(1), Vec::<usize>::new());
    }
}
