//! Schema-confirmed analysis results
//!
//! Only values of these types reach the presentation layer. Raw response
//! JSON never does.

use serde::Serialize;
use serde_json::Number;

/// Analysis result, tagged by which accepted shape matched
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ValidatedAnalysis {
    /// `status: "success"` plus a model ranking summary
    Ranking(RankingReport),
    /// Dataset overview, optional model performance and insights
    Overview(OverviewReport),
}

impl ValidatedAnalysis {
    pub fn shape_name(&self) -> &'static str {
        match self {
            ValidatedAnalysis::Ranking(_) => "ranking",
            ValidatedAnalysis::Overview(_) => "overview",
        }
    }

    /// Best model name, when the shape carries one
    pub fn best_model(&self) -> Option<&str> {
        match self {
            ValidatedAnalysis::Ranking(report) => Some(&report.best_model),
            ValidatedAnalysis::Overview(report) => report
                .model_performance
                .as_ref()
                .map(|p| p.best_model.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingReport {
    pub task_completed: String,
    pub best_model: String,
    pub best_auc_score: f64,
    pub cv_auc_mean: f64,
    pub cv_auc_std: f64,
    /// (model name, score) pairs in server order
    pub model_rankings: Vec<(String, f64)>,
    pub top_features: Vec<String>,
    pub model_stability: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewReport {
    pub dataset_analysis: DatasetAnalysis,
    /// Tolerated when absent
    pub model_performance: Option<ModelPerformance>,
    pub key_insights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetAnalysis {
    /// Counts keep the server's number as sent (`1000`, not `1000.0`)
    pub samples: Number,
    pub features: Number,
    pub feature_types: String,
    pub target_balance: String,
    pub data_quality: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelPerformance {
    pub best_model: String,
    pub test_auc: f64,
    pub test_accuracy: f64,
    /// Free-form, e.g. "0.87±0.01"
    pub cv_auc: String,
    pub features_used: Number,
    pub features_removed: Number,
}
