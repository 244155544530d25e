//! Submission evaluation: run the code, compare the output, score it

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    error::{AppError, AppResult},
    models::{Submission, Verdict, VerdictKind},
    sandbox::{ExecutionLimits, ExecutionSandbox},
};

/// Turns a submission into exactly one verdict
pub struct SubmissionEvaluator {
    sandbox: Arc<ExecutionSandbox>,
    limits: ExecutionLimits,
    full_score: u32,
}

impl SubmissionEvaluator {
    pub fn new(sandbox: Arc<ExecutionSandbox>, limits: ExecutionLimits, full_score: u32) -> Self {
        Self {
            sandbox,
            limits,
            full_score,
        }
    }

    /// Cheap pre-flight checks, run before a room slot is taken
    pub fn validate(&self, language: &str, source: &str) -> AppResult<()> {
        self.sandbox.validate(language, source).map(|_| ())
    }

    /// Execute `submission` and record its result and verdict onto it.
    ///
    /// `expected` of `None` accepts any successful run. Infrastructure
    /// failures leave the submission unevaluated.
    #[instrument(skip(self, submission, expected), fields(submission_id = %submission.id(), language = %submission.language()))]
    pub async fn evaluate(
        &self,
        submission: &mut Submission,
        expected: Option<&str>,
    ) -> AppResult<Verdict> {
        if submission.is_evaluated() {
            return Err(AppError::AlreadyEvaluated);
        }

        let result = self
            .sandbox
            .execute(submission.language(), submission.source(), &self.limits)
            .await?;

        let kind = match VerdictKind::from_failure(result.classification) {
            Some(failure) => failure,
            None => match expected {
                Some(expected) if !outputs_match(&result.stdout, expected) => {
                    VerdictKind::WrongOutput
                }
                _ => VerdictKind::Accepted,
            },
        };
        let score = if kind.is_accepted() { self.full_score } else { 0 };
        let verdict = Verdict::scored(kind, score, &result);

        debug!(
            classification = %result.classification,
            verdict = ?kind,
            score,
            "Submission evaluated"
        );
        submission.record(result, verdict.clone())?;
        Ok(verdict)
    }
}

/// Canonical form used for output comparison: LF line endings, no trailing
/// whitespace on any line, no trailing blank lines
pub fn normalize_output(output: &str) -> String {
    let unified = output.replace("\r\n", "\n");
    let lines: Vec<&str> = unified.lines().map(str::trim_end).collect();
    lines.join("\n").trim_end_matches('\n').to_string()
}

fn outputs_match(actual: &str, expected: &str) -> bool {
    normalize_output(actual) == normalize_output(expected)
}
