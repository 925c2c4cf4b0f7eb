//! Multi-label classifier score aggregation.
//!
//! Wraps a pretrained supervised fastText model (language identification,
//! quality classifiers) and reduces its per-label probabilities to the two
//! shapes the filtering pipelines consume: an aggregate of the best
//! requested label, and a full score vector over the requested labels.
//!
//! The model file is loaded once per path and shared read-only across every
//! scoring call; the per-document path does no I/O.

use std::collections::HashMap;
use std::sync::Arc;

use cached::proc_macro::cached;
use fasttext::FastText;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SignalError;

// Loaded models are cached by path and refreshed on a timer, mirroring the
// tokenizer cache: a replaced file is eventually picked up, but no run ever
// loads a model per document.
#[cached(time = 60, time_refresh = true, sync_writes = "by_key")]
fn load_model(path: String) -> Result<Arc<FastText>, String> {
    let mut model = FastText::new();
    model.load_model(&path)?;
    Ok(Arc::new(model))
}

/// Configuration for the classifier score aggregator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Path to the serialized fastText model.
    pub path: String,
    /// Labels of interest, in output order, spelled exactly as the model
    /// emits them (usually with the `__label__` prefix).
    pub labels: Vec<String>,
    /// Emit `top_label`, `top_score`, `total_score`.
    pub output_aggregate: bool,
    /// Emit one score per requested label.
    pub output_scores: bool,
}

impl ClassifierConfig {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            labels: Vec::new(),
            output_aggregate: true,
            output_scores: false,
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_aggregate(mut self, output_aggregate: bool) -> Self {
        self.output_aggregate = output_aggregate;
        self
    }

    pub fn with_scores(mut self, output_scores: bool) -> Self {
        self.output_scores = output_scores;
        self
    }

    pub fn validate(&self) -> Result<(), SignalError> {
        if self.labels.is_empty() {
            return Err(SignalError::InvalidArgument(
                "at least one label must be requested".into(),
            ));
        }
        if !self.output_aggregate && !self.output_scores {
            return Err(SignalError::InvalidArgument(
                "at least one of output_aggregate and output_scores must be set".into(),
            ));
        }
        Ok(())
    }
}

/// Aggregate over the requested labels of one document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoreAggregate {
    /// Requested label with the highest score. A document in which no
    /// requested label scores above zero reports the first requested label.
    pub top_label: String,
    pub top_score: f32,
    /// Sum of scores over exactly the requested labels.
    pub total_score: f32,
}

/// Output of one scoring call; fields follow the configured output flags.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoreRecord {
    pub aggregate: Option<ScoreAggregate>,
    /// One `(label, score)` per requested label, in request order.
    pub scores: Option<Vec<(String, f32)>>,
}

struct Folded {
    top_index: usize,
    top_score: f32,
    total_score: f32,
    scores: Vec<f32>,
}

/// Fold a prediction list down to the requested label subset.
///
/// A requested label the model never emits keeps its zero slot; a label the
/// model emits but nobody requested is dropped entirely, so it can neither
/// win `top_label` nor leak into `total_score`. Ties keep the earlier
/// prediction.
fn fold_predictions<'a>(
    preds: impl IntoIterator<Item = (&'a str, f32)>,
    labelmap: &HashMap<String, usize>,
) -> Folded {
    let mut scores = vec![0.0f32; labelmap.len()];
    let mut top_index = 0;
    let mut top_score = 0.0;
    let mut total_score = 0.0;
    for (label, prob) in preds {
        if let Some(&i) = labelmap.get(label) {
            scores[i] = prob;
            total_score += prob;
            if prob > top_score {
                top_index = i;
                top_score = prob;
            }
        }
    }
    Folded {
        top_index,
        top_score,
        total_score,
        scores,
    }
}

/// Scores documents against a shared fastText model.
pub struct ClassifierScorer {
    model: Arc<FastText>,
    labels: Vec<String>,
    labelmap: HashMap<String, usize>,
    output_aggregate: bool,
    output_scores: bool,
    space: Regex,
}

impl ClassifierScorer {
    /// Validate the configuration and load (or reuse) the model.
    ///
    /// An unreadable or malformed model path fails here, once for the whole
    /// run, never during document processing.
    pub fn new(config: &ClassifierConfig) -> Result<Self, SignalError> {
        config.validate()?;
        let model = load_model(config.path.clone()).map_err(SignalError::ModelLoad)?;
        info!(
            target: "signals::classifier",
            path = %config.path,
            labels = config.labels.len(),
            "classifier model ready"
        );
        Ok(Self {
            model,
            labels: config.labels.clone(),
            labelmap: config
                .labels
                .iter()
                .enumerate()
                .map(|(i, s)| (s.clone(), i))
                .collect(),
            output_aggregate: config.output_aggregate,
            output_scores: config.output_scores,
            space: Regex::new(r"\s+")?,
        })
    }

    /// Score one document over the requested labels.
    ///
    /// Newlines act as document separators inside fastText, so all
    /// whitespace runs are collapsed to single spaces before prediction.
    pub fn score(&self, text: &str) -> Result<ScoreRecord, SignalError> {
        let flat = self.space.replace_all(text, " ");
        let preds = self
            .model
            .predict(&flat, -1, 0.0)
            .map_err(SignalError::ModelLoad)?;
        let folded = fold_predictions(
            preds.iter().map(|p| (p.label.as_str(), p.prob)),
            &self.labelmap,
        );

        let aggregate = self.output_aggregate.then(|| ScoreAggregate {
            top_label: self.labels[folded.top_index].clone(),
            top_score: folded.top_score,
            total_score: folded.total_score,
        });
        let scores = self.output_scores.then(|| {
            self.labels
                .iter()
                .cloned()
                .zip(folded.scores.iter().copied())
                .collect()
        });
        Ok(ScoreRecord { aggregate, scores })
    }
}
