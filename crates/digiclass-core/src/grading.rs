//! The grading engine.
//!
//! Converts a learner's raw answers into a 0..=100 score and a grade. Grading
//! is all-or-nothing per question and never fails: a missing or malformed
//! answer simply earns zero for that question.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{AnswerValue, Answers, CorrectAnswer, Grade, Question, QuestionType};

/// Result of grading one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Answer key (`"q<position>"`).
    pub key: String,
    /// Points the question is worth.
    pub points: u32,
    /// Whether the submitted answer matched.
    pub correct: bool,
    /// False for review-only questions, which count toward neither total.
    pub gradable: bool,
}

/// Full result of grading a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeOutcome {
    pub score: u32,
    pub grade: Grade,
    pub earned_points: u64,
    pub total_points: u64,
    pub items: Vec<ItemOutcome>,
}

/// Grade `answers` against `questions`, with a per-question breakdown.
pub fn grade(questions: &[Question], answers: &Answers) -> GradeOutcome {
    let mut earned_points = 0u64;
    let mut total_points = 0u64;
    let mut items = Vec::with_capacity(questions.len());

    for question in questions {
        let key = question.answer_key();
        let gradable = question.is_gradable();
        let correct = gradable && is_correct(question, answers.get(&key));

        if gradable {
            total_points += u64::from(question.points);
            if correct {
                earned_points += u64::from(question.points);
            }
        }

        items.push(ItemOutcome {
            key,
            points: question.points,
            correct,
            gradable,
        });
    }

    let score = score_from_points(earned_points, total_points);

    GradeOutcome {
        score,
        grade: Grade::from_score(score),
        earned_points,
        total_points,
        items,
    }
}

/// Grade a submission, returning only `(score, grade)`.
pub fn grade_submission(questions: &[Question], answers: &Answers) -> (u32, Grade) {
    let outcome = grade(questions, answers);
    (outcome.score, outcome.grade)
}

/// Integer percentage of earned points, truncated. Zero when nothing is gradable.
pub fn score_from_points(earned: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    (earned.min(total) * 100 / total) as u32
}

/// Whether `answer` is an exact match for the question's correct answer.
pub fn is_correct(question: &Question, answer: Option<&AnswerValue>) -> bool {
    let (Some(expected), Some(answer)) = (&question.correct_answer, answer) else {
        return false;
    };

    match question.kind {
        QuestionType::Select => match (expected, answer) {
            (CorrectAnswer::Single(expected), AnswerValue::Text(given)) => given == expected,
            _ => false,
        },
        QuestionType::Checkbox => {
            let AnswerValue::Choices(given) = answer else {
                return false;
            };
            let expected: HashSet<&str> = match expected {
                CorrectAnswer::Multiple(values) => values.iter().map(String::as_str).collect(),
                CorrectAnswer::Single(value) => HashSet::from([value.as_str()]),
            };
            let given: HashSet<&str> = given.iter().map(String::as_str).collect();
            given == expected
        }
        QuestionType::Text => match (expected, answer) {
            (CorrectAnswer::Single(expected), AnswerValue::Text(given)) => {
                normalize_text(given) == normalize_text(expected)
            }
            _ => false,
        },
    }
}

fn normalize_text(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(
        position: u32,
        kind: QuestionType,
        points: u32,
        correct: Option<CorrectAnswer>,
    ) -> Question {
        Question {
            position,
            kind,
            prompt: format!("question {position}"),
            options: None,
            required: true,
            points,
            correct_answer: correct,
        }
    }

    fn single(value: &str) -> Option<CorrectAnswer> {
        Some(CorrectAnswer::Single(value.into()))
    }

    fn multiple(values: &[&str]) -> Option<CorrectAnswer> {
        Some(CorrectAnswer::Multiple(
            values.iter().map(|v| v.to_string()).collect(),
        ))
    }

    fn answers(pairs: Vec<(&str, AnswerValue)>) -> Answers {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn two_question_assignment() -> Vec<Question> {
        vec![
            question(1, QuestionType::Select, 1, single("4")),
            question(2, QuestionType::Checkbox, 1, multiple(&["a", "c"])),
        ]
    }

    #[test]
    fn no_gradable_points_scores_zero() {
        let questions = vec![
            question(1, QuestionType::Select, 3, None),
            question(2, QuestionType::Text, 2, None),
        ];
        let submitted = answers(vec![("q1", "4".into()), ("q2", "anything".into())]);
        assert_eq!(grade_submission(&questions, &submitted), (0, Grade::Two));
        assert_eq!(grade_submission(&[], &Answers::new()), (0, Grade::Two));
    }

    #[test]
    fn select_requires_exact_match() {
        let q = question(1, QuestionType::Select, 5, single("4"));
        assert!(is_correct(&q, Some(&"4".into())));
        assert!(!is_correct(&q, Some(&"3".into())));
        assert!(!is_correct(&q, Some(&" 4".into())));
        assert!(!is_correct(&q, Some(&AnswerValue::Other(serde_json::Value::Null))));
        assert!(!is_correct(&q, Some(&vec!["4"].into())));
        assert!(!is_correct(&q, None));
    }

    #[test]
    fn checkbox_compares_sets() {
        let q = question(1, QuestionType::Checkbox, 1, multiple(&["a", "b"]));
        assert!(is_correct(&q, Some(&vec!["b", "a"].into())));
        assert!(is_correct(&q, Some(&vec!["a", "b", "a"].into())));
        assert!(!is_correct(&q, Some(&vec!["a"].into())));
        assert!(!is_correct(&q, Some(&vec!["a", "b", "c"].into())));
        assert!(!is_correct(&q, Some(&"a".into())));
    }

    #[test]
    fn checkbox_with_single_correct_value() {
        let q = question(1, QuestionType::Checkbox, 1, single("a"));
        assert!(is_correct(&q, Some(&vec!["a"].into())));
        assert!(!is_correct(&q, Some(&vec!["a", "b"].into())));
    }

    #[test]
    fn text_ignores_case_and_surrounding_whitespace() {
        let q = question(1, QuestionType::Text, 1, single("Paris"));
        assert!(is_correct(&q, Some(&"  paris ".into())));
        assert!(is_correct(&q, Some(&"PARIS".into())));
        assert!(!is_correct(&q, Some(&"Pariss".into())));
        assert!(!is_correct(&q, Some(&vec!["Paris"].into())));
    }

    #[test]
    fn list_correct_answer_never_matches_select_or_text() {
        let select = question(1, QuestionType::Select, 1, multiple(&["4"]));
        let text = question(2, QuestionType::Text, 1, multiple(&["paris"]));
        assert!(!is_correct(&select, Some(&"4".into())));
        assert!(!is_correct(&text, Some(&"paris".into())));
    }

    #[test]
    fn end_to_end_two_questions() {
        let questions = two_question_assignment();

        let all_right = answers(vec![("q1", "4".into()), ("q2", vec!["c", "a"].into())]);
        assert_eq!(grade_submission(&questions, &all_right), (100, Grade::Five));

        let all_wrong = answers(vec![("q1", "3".into()), ("q2", vec!["a"].into())]);
        assert_eq!(grade_submission(&questions, &all_wrong), (0, Grade::Two));

        let half = answers(vec![("q1", "4".into()), ("q2", vec!["a"].into())]);
        assert_eq!(grade_submission(&questions, &half), (50, Grade::Two));
    }

    #[test]
    fn review_only_questions_are_skipped_for_both_totals() {
        let questions = vec![
            question(1, QuestionType::Select, 1, single("4")),
            question(2, QuestionType::Text, 10, None),
        ];
        let outcome = grade(&questions, &answers(vec![("q1", "4".into())]));
        assert_eq!(outcome.total_points, 1);
        assert_eq!(outcome.earned_points, 1);
        assert_eq!(outcome.score, 100);
        assert!(!outcome.items[1].gradable);
        assert!(!outcome.items[1].correct);
    }

    #[test]
    fn score_truncates_instead_of_rounding() {
        assert_eq!(score_from_points(2, 3), 66);
        assert_eq!(score_from_points(1, 3), 33);
        assert_eq!(score_from_points(0, 0), 0);
        assert_eq!(score_from_points(7, 7), 100);
    }

    #[test]
    fn weighted_points() {
        let questions = vec![
            question(1, QuestionType::Select, 3, single("x")),
            question(2, QuestionType::Text, 1, single("y")),
        ];
        let outcome = grade(&questions, &answers(vec![("q1", "x".into())]));
        assert_eq!(outcome.score, 75);
        assert_eq!(outcome.grade, Grade::Four);
    }

    #[test]
    fn grade_breakpoints() {
        let cases = [
            (89, Grade::Four),
            (90, Grade::Five),
            (74, Grade::Three),
            (75, Grade::Four),
            (59, Grade::Two),
            (60, Grade::Three),
            (0, Grade::Two),
            (100, Grade::Five),
        ];
        for (score, expected) in cases {
            assert_eq!(Grade::from_score(score), expected, "score {score}");
        }
    }

    #[test]
    fn adding_a_correct_answer_never_lowers_the_score() {
        let questions = vec![
            question(1, QuestionType::Select, 2, single("a")),
            question(2, QuestionType::Checkbox, 3, multiple(&["x", "y"])),
            question(3, QuestionType::Text, 5, single("word")),
        ];
        let mut submitted = answers(vec![
            ("q1", "b".into()),
            ("q2", vec!["x"].into()),
            ("q3", "other".into()),
        ]);
        let mut previous = grade(&questions, &submitted).score;
        assert_eq!(previous, 0);

        for (key, value) in [
            ("q2", AnswerValue::from(vec!["y", "x"])),
            ("q1", AnswerValue::from("a")),
            ("q3", AnswerValue::from(" Word")),
        ] {
            submitted.insert(key.to_string(), value);
            let score = grade(&questions, &submitted).score;
            assert!(score >= previous, "{score} < {previous}");
            previous = score;
        }
        assert_eq!(previous, 100);
    }

    #[test]
    fn answers_for_unknown_keys_are_ignored() {
        let questions = two_question_assignment();
        let submitted = answers(vec![
            ("q1", "4".into()),
            ("q2", vec!["a", "c"].into()),
            ("q99", "4".into()),
        ]);
        assert_eq!(grade(&questions, &submitted).score, 100);
    }
}
