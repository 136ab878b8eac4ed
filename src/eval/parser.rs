//! Parser for the judge model's two-line response
//!
//! The judge is asked for exactly:
//!
//! ```text
//! Score: <integer 1-10>
//! Justification: <free text>
//! ```
//!
//! Models drift from instructions, so this is kept as one pure function
//! with the malformed cases pinned down by tests. A parse failure never
//! aborts an evaluation batch; the caller records the item with score 0.

use crate::errors::{ChatError, Result};

/// Parsed judge verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeVerdict {
    /// Integer score in 1..=10
    pub score: u8,
    pub justification: String,
}

/// Parse the judge response. Lines may appear in any order and extra
/// lines are ignored, but both fields must be present and the score must
/// be an integer in 1..=10.
pub fn parse_judge_response(response: &str) -> Result<JudgeVerdict> {
    let score_line = response
        .lines()
        .find(|line| line.trim_start().starts_with("Score:"))
        .ok_or_else(|| {
            ChatError::EvaluationParseFailure("missing 'Score:' line".to_string())
        })?;

    let justification_line = response
        .lines()
        .find(|line| line.trim_start().starts_with("Justification:"))
        .ok_or_else(|| {
            ChatError::EvaluationParseFailure("missing 'Justification:' line".to_string())
        })?;

    let raw_score = field_value(score_line);
    // Tolerate the bracketed form from the prompt template ("[8]")
    let raw_score = raw_score.trim_matches(&['[', ']'][..]).trim();
    let score: i64 = raw_score.parse().map_err(|_| {
        ChatError::EvaluationParseFailure(format!("non-integer score: '{}'", raw_score))
    })?;

    if !(1..=10).contains(&score) {
        return Err(ChatError::EvaluationParseFailure(format!(
            "score {} outside 1..=10",
            score
        )));
    }

    Ok(JudgeVerdict {
        score: score as u8,
        justification: field_value(justification_line).to_string(),
    })
}

/// Everything after the first ':' on the line, trimmed
fn field_value(line: &str) -> &str {
    match line.split_once(':') {
        Some((_, value)) => value.trim(),
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_response() {
        let verdict =
            parse_judge_response("Score: 8\nJustification: Accurate and relevant.").unwrap();
        assert_eq!(verdict.score, 8);
        assert_eq!(verdict.justification, "Accurate and relevant.");
    }

    #[test]
    fn test_bracketed_score() {
        let verdict = parse_judge_response("Score: [10]\nJustification: Perfect.").unwrap();
        assert_eq!(verdict.score, 10);
    }

    #[test]
    fn test_extra_whitespace_and_lines() {
        let response = "Here is my assessment.\n  Score:  7 \n  Justification:  Mostly right. \nThanks!";
        let verdict = parse_judge_response(response).unwrap();
        assert_eq!(verdict.score, 7);
        assert_eq!(verdict.justification, "Mostly right.");
    }

    #[test]
    fn test_reversed_line_order() {
        let verdict =
            parse_judge_response("Justification: Fine.\nScore: 5").unwrap();
        assert_eq!(verdict.score, 5);
    }

    #[test]
    fn test_justification_containing_colon() {
        let verdict = parse_judge_response(
            "Score: 6\nJustification: Partially correct: misses the margin concept.",
        )
        .unwrap();
        assert_eq!(
            verdict.justification,
            "Partially correct: misses the margin concept."
        );
    }

    #[test]
    fn test_missing_score_line() {
        let err = parse_judge_response("Justification: no score given").unwrap_err();
        assert!(matches!(err, ChatError::EvaluationParseFailure(_)));
        assert!(err.to_string().contains("Score"));
    }

    #[test]
    fn test_missing_justification_line() {
        let err = parse_judge_response("Score: 9").unwrap_err();
        assert!(matches!(err, ChatError::EvaluationParseFailure(_)));
        assert!(err.to_string().contains("Justification"));
    }

    #[test]
    fn test_non_integer_score() {
        let err = parse_judge_response("Score: eight\nJustification: ok").unwrap_err();
        assert!(matches!(err, ChatError::EvaluationParseFailure(_)));
    }

    #[test]
    fn test_fractional_score_rejected() {
        let err = parse_judge_response("Score: 7.5\nJustification: ok").unwrap_err();
        assert!(matches!(err, ChatError::EvaluationParseFailure(_)));
    }

    #[test]
    fn test_out_of_range_scores_rejected() {
        for bad in ["0", "11", "-3", "100"] {
            let response = format!("Score: {}\nJustification: ok", bad);
            assert!(parse_judge_response(&response).is_err(), "score {}", bad);
        }
    }

    #[test]
    fn test_empty_response() {
        assert!(parse_judge_response("").is_err());
    }
}
