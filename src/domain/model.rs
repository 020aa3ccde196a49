//! Pre-trained lap-time regressors.
//!
//! Artifacts are gradient-boosted tree ensembles from one of two model
//! families. Each family stores its training-time feature names in a different
//! place; [`RegressionModel::feature_names`] hides that difference.

use serde::{Deserialize, Serialize};

/// How a split node compares a feature value against its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitRule {
    /// `value < threshold` goes left.
    LessThan,
    /// `value <= threshold` goes left.
    LessOrEqual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        /// Branch taken when the feature value is missing (NaN).
        #[serde(default)]
        default_left: bool,
    },
    Leaf {
        value: f64,
    },
}

/// A single regression tree stored as a flat node array rooted at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Children must come after their parent, which also rules out cycles.
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!(
                        "node {} splits on feature {} but the model has {} features",
                        idx, feature, n_features
                    ));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!("node {} has invalid child index {}", idx, child));
                    }
                }
            }
        }
        Ok(())
    }

    fn predict(&self, row: &[f64], rule: SplitRule) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let x = row[*feature];
                    let go_left = if x.is_nan() {
                        *default_left
                    } else {
                        match rule {
                            SplitRule::LessThan => x < *threshold,
                            SplitRule::LessOrEqual => x <= *threshold,
                        }
                    };
                    idx = if go_left { *left } else { *right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booster {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<RegressionTree>,
}

/// Gradient-boosted regressor whose schema lives on its booster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XgbRegressor {
    pub booster: Booster,
}

impl XgbRegressor {
    pub fn booster(&self) -> &Booster {
        &self.booster
    }
}

/// Gradient-boosted regressor exposing its schema directly.
/// The initial score is folded into the first tree's leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LgbmRegressor {
    #[serde(rename = "feature_name_")]
    pub feature_name: Vec<String>,
    pub trees: Vec<RegressionTree>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum RegressionModel {
    Xgboost(XgbRegressor),
    Lightgbm(LgbmRegressor),
}

impl RegressionModel {
    /// Training-time feature names, in the order the model expects them.
    pub fn feature_names(&self) -> &[String] {
        match self {
            RegressionModel::Xgboost(m) => &m.booster().feature_names,
            RegressionModel::Lightgbm(m) => &m.feature_name,
        }
    }

    pub fn family(&self) -> &'static str {
        match self {
            RegressionModel::Xgboost(_) => "xgboost",
            RegressionModel::Lightgbm(_) => "lightgbm",
        }
    }

    fn trees(&self) -> &[RegressionTree] {
        match self {
            RegressionModel::Xgboost(m) => &m.booster.trees,
            RegressionModel::Lightgbm(m) => &m.trees,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let n_features = self.feature_names().len();
        if n_features == 0 {
            return Err("model declares no features".to_string());
        }
        if self.trees().is_empty() {
            return Err("model has no trees".to_string());
        }
        for (i, tree) in self.trees().iter().enumerate() {
            tree.validate(n_features)
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }

    /// Predicts one row laid out in [`Self::feature_names`] order.
    ///
    /// The model must have passed [`Self::validate`].
    pub fn predict_row(&self, row: &[f64]) -> Result<f64, String> {
        let expected = self.feature_names().len();
        if row.len() != expected {
            return Err(format!(
                "feature length mismatch: got {}, expected {}",
                row.len(),
                expected
            ));
        }

        let (base, rule) = match self {
            RegressionModel::Xgboost(m) => (m.booster.base_score, SplitRule::LessThan),
            RegressionModel::Lightgbm(_) => (0.0, SplitRule::LessOrEqual),
        };

        Ok(self
            .trees()
            .iter()
            .fold(base, |acc, tree| acc + tree.predict(row, rule)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> RegressionTree {
        RegressionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                    default_left: true,
                },
                TreeNode::Leaf { value: left },
                TreeNode::Leaf { value: right },
            ],
        }
    }

    pub(crate) fn xgb_model(features: &[&str], base_score: f64) -> RegressionModel {
        RegressionModel::Xgboost(XgbRegressor {
            booster: Booster {
                feature_names: features.iter().map(|s| s.to_string()).collect(),
                base_score,
                trees: vec![stump(0, 10.0, -0.5, 0.5)],
            },
        })
    }

    #[test]
    fn test_families_expose_feature_names() {
        let xgb = xgb_model(&["LapNumber", "TyreLife"], 80.0);
        assert_eq!(xgb.feature_names(), ["LapNumber", "TyreLife"]);
        assert_eq!(xgb.family(), "xgboost");

        let lgbm = RegressionModel::Lightgbm(LgbmRegressor {
            feature_name: vec!["Stint".to_string()],
            trees: vec![stump(0, 1.0, 90.0, 91.0)],
        });
        assert_eq!(lgbm.feature_names(), ["Stint"]);
    }

    #[test]
    fn test_split_rules_differ_at_threshold() {
        let xgb = xgb_model(&["LapNumber"], 80.0);
        assert_eq!(xgb.predict_row(&[10.0]).unwrap(), 80.5);
        assert_eq!(xgb.predict_row(&[9.0]).unwrap(), 79.5);

        let lgbm = RegressionModel::Lightgbm(LgbmRegressor {
            feature_name: vec!["LapNumber".to_string()],
            trees: vec![stump(0, 10.0, 79.5, 80.5), stump(0, 5.0, 1.0, 2.0)],
        });
        assert_eq!(lgbm.predict_row(&[10.0]).unwrap(), 81.5);
    }

    #[test]
    fn test_missing_values_follow_default_branch() {
        let xgb = xgb_model(&["LapNumber"], 80.0);
        assert_eq!(xgb.predict_row(&[f64::NAN]).unwrap(), 79.5);
    }

    #[test]
    fn test_row_length_mismatch() {
        let xgb = xgb_model(&["LapNumber", "Stint"], 80.0);
        assert!(xgb.predict_row(&[1.0]).is_err());
    }

    #[test]
    fn test_validate_rejects_backward_children() {
        let model = RegressionModel::Xgboost(XgbRegressor {
            booster: Booster {
                feature_names: vec!["LapNumber".to_string()],
                base_score: 0.0,
                trees: vec![RegressionTree {
                    nodes: vec![TreeNode::Split {
                        feature: 0,
                        threshold: 1.0,
                        left: 0,
                        right: 1,
                        default_left: false,
                    }],
                }],
            },
        });
        assert!(model.validate().is_err());
        assert!(xgb_model(&["LapNumber"], 0.0).validate().is_ok());
    }

    #[test]
    fn test_artifact_json_shape() {
        let json = r#"{
            "family": "lightgbm",
            "feature_name_": ["LapNumber", "Compound_SOFT"],
            "trees": [{ "nodes": [
                { "kind": "split", "feature": 1, "threshold": 0.5, "left": 1, "right": 2 },
                { "kind": "leaf", "value": 92.1 },
                { "kind": "leaf", "value": 90.4 }
            ]}]
        }"#;

        let model: RegressionModel = serde_json::from_str(json).unwrap();
        assert!(model.validate().is_ok());
        assert_eq!(model.predict_row(&[3.0, 1.0]).unwrap(), 90.4);
    }
}
