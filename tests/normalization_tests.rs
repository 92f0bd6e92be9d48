use quizmaker::normalize_question_type;
use quizmaker::wire::VerifyBody;

const INPUTS: &[&str] = &[
    "Short Answer",
    "Multiple Choice",
    "Descriptive",
    "short_answer",
    "multiple_choice",
    "description",
    "Random",
    "SHORT ANSWER",
    "mUlTiPlE cHoIcE",
    "Essay Question",
    "",
    "  padded  ",
    "Ünïcode Týpe",
];

#[test]
fn maps_display_labels_to_service_names() {
    assert_eq!(normalize_question_type("Short Answer"), "short_answer");
    assert_eq!(normalize_question_type("Multiple Choice"), "multiple_choice");
    assert_eq!(normalize_question_type("Descriptive"), "description");
    assert_eq!(normalize_question_type("SHORT ANSWER"), "short_answer");
}

#[test]
fn passes_unknown_values_through_lowercased() {
    assert_eq!(normalize_question_type("Essay Question"), "essay question");
    assert_eq!(normalize_question_type("short_answer"), "short_answer");
    assert_eq!(normalize_question_type(""), "");
}

#[test]
fn normalization_is_idempotent() {
    for input in INPUTS {
        let once = normalize_question_type(input);
        let twice = normalize_question_type(&once);
        assert_eq!(once, twice, "not idempotent for {:?}", input);
    }
}

#[test]
fn verify_body_normalizes_type() {
    let body = VerifyBody::new("What is 2+2?", "4", "Short Answer");
    assert_eq!(body.question_type, "short_answer");
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["question"], "What is 2+2?");
    assert_eq!(json["answer"], "4");
}
