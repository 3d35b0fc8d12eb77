//! Canned service responses

use serde_json::{json, Value};

/// Upload success envelope as returned by the service
pub fn upload_response(directory: &str) -> Value {
    json!({
        "status": "success",
        "directory": directory,
        "message": "Files uploaded successfully"
    })
}

/// Ranking-shaped analysis success
pub fn ranking_response() -> Value {
    json!({
        "status": "success",
        "result": {
            "task_completed": "done",
            "best_model": "xgboost",
            "best_auc_score": 0.91,
            "cv_auc_mean": 0.89,
            "cv_auc_std": 0.02,
            "model_rankings": [["xgboost", 0.91], ["logreg", 0.85]],
            "top_features": ["age", "bmi"],
            "model_stability": "high",
            "recommendation": "deploy xgboost"
        }
    })
}

/// Overview-shaped analysis success
pub fn overview_response() -> Value {
    json!({
        "result": {
            "dataset_analysis": {
                "samples": 1000,
                "features": 12,
                "feature_types": "mixed",
                "target_balance": "balanced",
                "data_quality": "good"
            },
            "model_performance": {
                "best_model": "rf",
                "test_auc": 0.88,
                "test_accuracy": 0.8,
                "cv_auc": "0.87±0.01",
                "features_used": 12,
                "features_removed": 0
            },
            "key_insights": ["age matters"]
        }
    })
}
