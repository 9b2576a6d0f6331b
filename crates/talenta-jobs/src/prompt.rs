//! Evaluation prompt assembly.

use talenta_retrieval::RubricContext;

/// Build the evaluation prompt from the vacancy title, extracted document
/// texts, and retrieved rubric guidance.
///
/// The rubric sections may be empty when retrieval failed; the task and
/// output schema sections are always present.
pub fn build_prompt(
    job_title: &str,
    cv_text: &str,
    report_text: &str,
    rubrics: &RubricContext,
) -> String {
    let title = if job_title.trim().is_empty() {
        "-"
    } else {
        job_title
    };

    format!(
        r#"You are an ATS-like evaluator for internship candidates.

Vacancy title: {title}

=== CV EVALUATION CRITERIA ===
{cv_rubrics}

=== PROJECT REPORT EVALUATION CRITERIA ===
{project_rubrics}

=== CV TEXT (raw) ===
{cv_text}

=== PROJECT REPORT TEXT (raw) ===
{report_text}

Task:
1. Evaluate how well the CV matches the vacancy title (0-1), guided by the CV criteria.
2. Evaluate the project report quality on a 1-5 scale, guided by the report criteria.
3. Give short, constructive feedback for the CV and the project.
4. Give a concise overall summary.

Return ONLY valid JSON with this exact schema.
Do NOT wrap it in Markdown or code fences.

{{
  "cvMatchRate": 0.0-1.0 (number),
  "cvFeedback": "string",
  "projectScore": 0.0-5.0 (number),
  "projectFeedback": "string",
  "overallSummary": "string"
}}"#,
        title = title,
        cv_rubrics = rubrics.cv,
        project_rubrics = rubrics.project,
        cv_text = cv_text,
        report_text = report_text,
    )
}
