use leadscout_core::normalize::normalize_name;

#[test]
fn director_name_with_honorific_and_extra_whitespace() {
    let (normalized, trace) = normalize_name("  Mr   Bongani    Mthembu  ");
    assert_eq!(normalized.joined, "bongani mthembu");
    assert_eq!(trace.stripped_honorifics, vec!["mr".to_string()]);
}

#[test]
fn fully_honorific_input_normalizes_to_empty() {
    let (normalized, _) = normalize_name("Prof.");
    assert!(normalized.is_empty());
}

#[test]
fn mixed_case_and_punctuation_in_honorific_is_still_stripped() {
    let (normalized, trace) = normalize_name("DR. Anita Reddy");
    assert_eq!(normalized.joined, "anita reddy");
    assert_eq!(trace.stripped_honorifics, vec!["dr".to_string()]);
}

#[test]
fn compound_surname_keeps_every_token() {
    let (normalized, _) = normalize_name("Pieter van der Merwe");
    assert_eq!(
        normalized.tokens,
        vec![
            "pieter".to_string(),
            "van".to_string(),
            "der".to_string(),
            "merwe".to_string()
        ]
    );
}
