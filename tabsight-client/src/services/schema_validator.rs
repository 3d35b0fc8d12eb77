//! Schema validation of untrusted analysis responses
//!
//! The analysis endpoint answers in one of two incompatible shapes depending
//! on which server code path handled the request:
//!
//! - **Ranking**: `status == "success"` and a `result` object with nine
//!   mandatory fields (best model, AUC statistics, rankings, features).
//! - **Overview**: a `result` object with `dataset_analysis`, an optional
//!   `model_performance` and `key_insights`.
//!
//! # Resolution
//! Ranking is attempted first, then Overview; the first full match wins.
//! When neither matches, the error carries the faults found under *both*
//! attempts. Numbers are only checked to be finite, never range-checked.

use crate::error::{FieldFault, ValidationError};
use crate::models::{
    DatasetAnalysis, ModelPerformance, OverviewReport, RankingReport, ValidatedAnalysis,
};
use serde_json::{Map, Number, Value};
use tracing::debug;

/// Literal `status` value required by the ranking shape
pub const SUCCESS_STATUS: &str = "success";

const ROOT_PATH: &str = "$";

/// Resolve `raw` into one of the accepted result shapes
pub fn validate(raw: &Value) -> Result<ValidatedAnalysis, ValidationError> {
    let ranking = match read_ranking(raw) {
        Ok(report) => return Ok(ValidatedAnalysis::Ranking(report)),
        Err(faults) => faults,
    };

    debug!(
        faults = ranking.len(),
        "Response is not a ranking result, trying overview shape"
    );

    match read_overview(raw) {
        Ok(report) => Ok(ValidatedAnalysis::Overview(report)),
        Err(overview) => Err(ValidationError { ranking, overview }),
    }
}

fn read_ranking(raw: &Value) -> Result<RankingReport, Vec<FieldFault>> {
    let mut reader = FieldReader::default();
    let Some(root) = reader.root(raw) else {
        return reader.finish(None);
    };

    reader.literal(root, "", "status", SUCCESS_STATUS);

    let Some(result) = reader.object(root, "", "result") else {
        return reader.finish(None);
    };

    let path = "result";
    let task_completed = reader.string(result, path, "task_completed");
    let best_model = reader.string(result, path, "best_model");
    let best_auc_score = reader.number(result, path, "best_auc_score");
    let cv_auc_mean = reader.number(result, path, "cv_auc_mean");
    let cv_auc_std = reader.number(result, path, "cv_auc_std");
    let model_rankings = reader.ranking_pairs(result, path, "model_rankings");
    let top_features = reader.string_list(result, path, "top_features");
    let model_stability = reader.string(result, path, "model_stability");
    let recommendation = reader.string(result, path, "recommendation");

    let report = (|| {
        Some(RankingReport {
            task_completed: task_completed?,
            best_model: best_model?,
            best_auc_score: best_auc_score?,
            cv_auc_mean: cv_auc_mean?,
            cv_auc_std: cv_auc_std?,
            model_rankings: model_rankings?,
            top_features: top_features?,
            model_stability: model_stability?,
            recommendation: recommendation?,
        })
    })();

    reader.finish(report)
}

fn read_overview(raw: &Value) -> Result<OverviewReport, Vec<FieldFault>> {
    let mut reader = FieldReader::default();
    let Some(root) = reader.root(raw) else {
        return reader.finish(None);
    };

    let Some(result) = reader.object(root, "", "result") else {
        return reader.finish(None);
    };

    let dataset_analysis = reader
        .object(result, "result", "dataset_analysis")
        .and_then(|dataset| read_dataset_analysis(&mut reader, dataset));

    // Absent (or null) performance is tolerated; a present one must be complete.
    let model_performance = match result.get("model_performance") {
        None | Some(Value::Null) => Some(None),
        Some(_) => reader
            .object(result, "result", "model_performance")
            .and_then(|performance| read_model_performance(&mut reader, performance))
            .map(Some),
    };

    let key_insights = reader.string_list(result, "result", "key_insights");

    let report = (|| {
        Some(OverviewReport {
            dataset_analysis: dataset_analysis?,
            model_performance: model_performance?,
            key_insights: key_insights?,
        })
    })();

    reader.finish(report)
}

fn read_dataset_analysis(
    reader: &mut FieldReader,
    dataset: &Map<String, Value>,
) -> Option<DatasetAnalysis> {
    let path = "result.dataset_analysis";
    let samples = reader.count(dataset, path, "samples");
    let features = reader.count(dataset, path, "features");
    let feature_types = reader.string(dataset, path, "feature_types");
    let target_balance = reader.string(dataset, path, "target_balance");
    let data_quality = reader.string(dataset, path, "data_quality");

    Some(DatasetAnalysis {
        samples: samples?,
        features: features?,
        feature_types: feature_types?,
        target_balance: target_balance?,
        data_quality: data_quality?,
    })
}

fn read_model_performance(
    reader: &mut FieldReader,
    performance: &Map<String, Value>,
) -> Option<ModelPerformance> {
    let path = "result.model_performance";
    let best_model = reader.string(performance, path, "best_model");
    let test_auc = reader.number(performance, path, "test_auc");
    let test_accuracy = reader.number(performance, path, "test_accuracy");
    let cv_auc = reader.string(performance, path, "cv_auc");
    let features_used = reader.count(performance, path, "features_used");
    let features_removed = reader.count(performance, path, "features_removed");

    Some(ModelPerformance {
        best_model: best_model?,
        test_auc: test_auc?,
        test_accuracy: test_accuracy?,
        cv_auc: cv_auc?,
        features_used: features_used?,
        features_removed: features_removed?,
    })
}

/// Reads typed fields, recording a fault for every field it cannot read.
///
/// Every `None` returned by a reader method has a matching recorded fault.
#[derive(Default)]
struct FieldReader {
    faults: Vec<FieldFault>,
}

impl FieldReader {
    fn finish<T>(self, value: Option<T>) -> Result<T, Vec<FieldFault>> {
        match value {
            Some(value) if self.faults.is_empty() => Ok(value),
            _ if !self.faults.is_empty() => Err(self.faults),
            _ => Err(vec![FieldFault::missing(ROOT_PATH)]),
        }
    }

    fn root<'v>(&mut self, raw: &'v Value) -> Option<&'v Map<String, Value>> {
        match raw {
            Value::Object(map) => Some(map),
            _ => {
                self.faults.push(FieldFault::wrong_type(ROOT_PATH, "object"));
                None
            }
        }
    }

    fn field<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<(&'v Value, String)> {
        let path = join_path(parent, key);
        match object.get(key) {
            Some(value) => Some((value, path)),
            None => {
                self.faults.push(FieldFault::missing(path));
                None
            }
        }
    }

    fn object<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<&'v Map<String, Value>> {
        let (value, path) = self.field(object, parent, key)?;
        match value {
            Value::Object(map) => Some(map),
            _ => {
                self.faults.push(FieldFault::wrong_type(path, "object"));
                None
            }
        }
    }

    fn string(&mut self, object: &Map<String, Value>, parent: &str, key: &str) -> Option<String> {
        let (value, path) = self.field(object, parent, key)?;
        self.expect_string(value, path)
    }

    fn number(&mut self, object: &Map<String, Value>, parent: &str, key: &str) -> Option<f64> {
        let (value, path) = self.field(object, parent, key)?;
        self.expect_number(value, path)
    }

    fn count(&mut self, object: &Map<String, Value>, parent: &str, key: &str) -> Option<Number> {
        let (value, path) = self.field(object, parent, key)?;
        match value {
            Value::Number(number) => Some(number.clone()),
            _ => {
                self.faults.push(FieldFault::wrong_type(path, "number"));
                None
            }
        }
    }

    fn literal(&mut self, object: &Map<String, Value>, parent: &str, key: &str, expected: &'static str) {
        if let Some(value) = self.string(object, parent, key) {
            if value != expected {
                self.faults
                    .push(FieldFault::wrong_value(join_path(parent, key), expected));
            }
        }
    }

    fn string_list(
        &mut self,
        object: &Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<Vec<String>> {
        let (value, path) = self.field(object, parent, key)?;
        let items = self.expect_array(value, &path, "array of strings")?;

        let mut strings = Vec::with_capacity(items.len());
        let mut complete = true;
        for (index, item) in items.iter().enumerate() {
            match self.expect_string(item, format!("{}[{}]", path, index)) {
                Some(s) => strings.push(s),
                None => complete = false,
            }
        }
        complete.then_some(strings)
    }

    fn ranking_pairs(
        &mut self,
        object: &Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<Vec<(String, f64)>> {
        let (value, path) = self.field(object, parent, key)?;
        let items = self.expect_array(value, &path, "array of [string, number] pairs")?;

        let mut pairs = Vec::with_capacity(items.len());
        let mut complete = true;
        for (index, item) in items.iter().enumerate() {
            let item_path = format!("{}[{}]", path, index);
            let pair = match item {
                Value::Array(pair) if pair.len() == 2 => {
                    let name = self.expect_string(&pair[0], format!("{}[0]", item_path));
                    let score = self.expect_number(&pair[1], format!("{}[1]", item_path));
                    name.zip(score)
                }
                _ => {
                    self.faults
                        .push(FieldFault::wrong_type(item_path, "[string, number] pair"));
                    None
                }
            };
            match pair {
                Some(pair) => pairs.push(pair),
                None => complete = false,
            }
        }
        complete.then_some(pairs)
    }

    fn expect_string(&mut self, value: &Value, path: String) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.faults.push(FieldFault::wrong_type(path, "string"));
                None
            }
        }
    }

    fn expect_number(&mut self, value: &Value, path: String) -> Option<f64> {
        let number = value.as_f64().filter(|n| n.is_finite());
        if number.is_none() {
            self.faults.push(FieldFault::wrong_type(path, "finite number"));
        }
        number
    }

    fn expect_array<'v>(
        &mut self,
        value: &'v Value,
        path: &str,
        expected: &'static str,
    ) -> Option<&'v Vec<Value>> {
        match value {
            Value::Array(items) => Some(items),
            _ => {
                self.faults.push(FieldFault::wrong_type(path, expected));
                None
            }
        }
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}
