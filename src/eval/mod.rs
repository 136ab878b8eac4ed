//! Answer-quality evaluation with an LLM judge
//!
//! Runs a fixed question set through the retrieval pipeline with empty
//! history (evaluation is context-free and reproducible regardless of the
//! session's conversation state), then has a judge model score each
//! answer against ground truth on a 1-10 rubric. Per-item failures are
//! recorded with the score-0 sentinel and never stop the batch.

pub mod parser;

pub use parser::{parse_judge_response, JudgeVerdict};

use crate::chat::RetrievalChain;
use crate::providers::{GenerateRequest, GenerativeProvider};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Rubric prompt sent to the judge model
const JUDGE_PROMPT: &str = "You are an impartial evaluator. Your task is to assess the \
quality of a generated answer based on a ground truth reference. Provide a score from 1 \
to 10, where 1 is poor and 10 is excellent, based on accuracy and relevance. Also, provide \
a brief justification for your score.

Here is the data:
[Question]: {question}
[Ground Truth]: {ground_truth}
[Generated Answer]: {generated_answer}

Please provide your response in the following format, and nothing else:
Score: [Your score from 1 to 10]
Justification: [Your brief justification]";

/// One evaluation question with its reference answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalQuestion {
    pub question: String,
    pub ground_truth: String,
}

/// Scored result for one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRecord {
    pub question: String,
    pub generated_answer: String,
    pub ground_truth: String,
    /// 1-10 from the judge; 0 is the error sentinel
    pub score: u8,
    pub justification: String,
}

/// Results of one evaluation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub records: Vec<EvalRecord>,
    pub ran_at: DateTime<Utc>,
}

impl EvaluationReport {
    /// Mean score across all items, error items included
    pub fn average_score(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let total: u32 = self.records.iter().map(|r| r.score as u32).sum();
        total as f64 / self.records.len() as f64
    }
}

/// The built-in question set (machine learning fundamentals)
pub fn default_questions() -> Vec<EvalQuestion> {
    vec![
        EvalQuestion {
            question: "What is Logistic Regression?".to_string(),
            ground_truth: "Logistic Regression is a supervised machine learning algorithm \
used for classification problems. Unlike linear regression which predicts continuous \
values it predicts the probability that an input belongs to a specific class. It is used \
for binary classification where the output can be one of two possible categories such as \
Yes/No, True/False or 0/1. It uses the sigmoid function to convert inputs into a \
probability value between 0 and 1."
                .to_string(),
        },
        EvalQuestion {
            question: "What is support vector machine".to_string(),
            ground_truth: "Support Vector Machine (SVM) is a supervised machine learning \
algorithm used for classification and regression tasks. It tries to find the best \
boundary known as hyperplane that separates different classes in the data. It is useful \
when you want to do binary classification like spam vs. not spam or cat vs. dog. The main \
goal of SVM is to maximize the margin between the two classes. The larger the margin the \
better the model performs on new and unseen data."
                .to_string(),
        },
        EvalQuestion {
            question: "What is decision tree?".to_string(),
            ground_truth: "A Decision Tree is a supervised machine learning algorithm used \
for classification and regression tasks. It works by splitting the data into subsets \
based on the value of input features. Each split is made to maximize the separation of \
classes or minimize the error in predictions. The tree structure consists of nodes where \
each node represents a feature and branches represent the decision based on that feature. \
The leaves of the tree represent the final output or class label."
                .to_string(),
        },
    ]
}

/// Drives evaluation runs against a retrieval chain
pub struct Evaluator {
    judge: Arc<dyn GenerativeProvider>,
}

impl Evaluator {
    pub fn new(judge: Arc<dyn GenerativeProvider>) -> Self {
        Self { judge }
    }

    /// Evaluate every question against the chain.
    ///
    /// Each question runs with empty history. Pipeline or judge failures
    /// become score-0 records with a diagnostic justification; the batch
    /// always completes.
    pub async fn evaluate(
        &self,
        chain: &RetrievalChain,
        questions: &[EvalQuestion],
    ) -> EvaluationReport {
        let mut records = Vec::with_capacity(questions.len());

        for item in questions {
            let record = self.evaluate_one(chain, item).await;
            records.push(record);
        }

        let report = EvaluationReport {
            records,
            ran_at: Utc::now(),
        };
        info!(
            items = report.records.len(),
            average = report.average_score(),
            "evaluation run complete"
        );
        report
    }

    async fn evaluate_one(&self, chain: &RetrievalChain, item: &EvalQuestion) -> EvalRecord {
        let generated = match chain.run_turn(&[], &item.question).await {
            Ok(outcome) => outcome.answer,
            Err(e) => {
                warn!(question = %item.question, error = %e, "pipeline failed during evaluation");
                return error_record(item, "N/A", &format!("Pipeline error: {}", e));
            }
        };

        let prompt = JUDGE_PROMPT
            .replace("{question}", &item.question)
            .replace("{ground_truth}", &item.ground_truth)
            .replace("{generated_answer}", &generated);

        let response = match self.judge.generate(GenerateRequest::from_prompt(prompt)).await {
            Ok(text) => text,
            Err(e) => {
                warn!(question = %item.question, error = %e, "judge call failed");
                return error_record(item, &generated, &format!("Judge error: {}", e));
            }
        };

        match parse_judge_response(&response) {
            Ok(verdict) => EvalRecord {
                question: item.question.clone(),
                generated_answer: generated,
                ground_truth: item.ground_truth.clone(),
                score: verdict.score,
                justification: verdict.justification,
            },
            Err(e) => {
                warn!(question = %item.question, error = %e, "unparseable judge response");
                error_record(item, &generated, &format!("Error in scoring: {}", e))
            }
        }
    }
}

fn error_record(item: &EvalQuestion, generated: &str, diagnostic: &str) -> EvalRecord {
    EvalRecord {
        question: item.question.clone(),
        generated_answer: generated.to_string(),
        ground_truth: item.ground_truth.clone(),
        score: 0,
        justification: diagnostic.to_string(),
    }
}
