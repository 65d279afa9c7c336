use leadscout_core::dictionary::NameDictionary;
use leadscout_core::model::Ethnicity;
use leadscout_core::normalize::normalize_name;
use leadscout_core::rules::classify;
use std::time::Instant;

fn dict() -> NameDictionary {
    NameDictionary::load_seed()
}

#[test]
fn coverage_stats_report_every_seeded_ethnicity() {
    let d = dict();
    let stats = d.coverage_stats();
    for ethnicity in [
        Ethnicity::African,
        Ethnicity::Indian,
        Ethnicity::CapeMalay,
        Ethnicity::Coloured,
        Ethnicity::White,
    ] {
        assert!(
            stats.get(&ethnicity).copied().unwrap_or(0) > 0,
            "expected at least one seed entry for {ethnicity}"
        );
    }
}

#[test]
fn indian_surname_classifies_with_surname_confidence() {
    let d = dict();
    let (normalized, _) = normalize_name("Rajesh Naidoo");
    let result = classify(&normalized, &d, "Rajesh Naidoo", Instant::now()).unwrap();
    assert_eq!(result.ethnicity, Ethnicity::Indian);
    assert!((result.confidence - 0.85).abs() < 1e-9);
}

#[test]
fn cape_malay_given_name_alone_classifies_with_given_name_confidence() {
    let d = dict();
    let (normalized, _) = normalize_name("Fatima");
    let result = classify(&normalized, &d, "Fatima", Instant::now()).unwrap();
    assert_eq!(result.ethnicity, Ethnicity::CapeMalay);
    assert!((result.confidence - 0.75).abs() < 1e-9);
}

#[test]
fn name_with_no_dictionary_hits_is_not_classified_by_rules() {
    let d = dict();
    let (normalized, _) = normalize_name("Zzqx Qwerty");
    assert!(classify(&normalized, &d, "Zzqx Qwerty", Instant::now()).is_none());
}
