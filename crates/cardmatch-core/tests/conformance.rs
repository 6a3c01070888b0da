//! End-to-end checks through the public API: text records against patterns,
//! and cards against cards.
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use cardmatch_core::{
    Card, ComponentSpec, DiffKind, MatchConfig, MatchDiagnostic, MatchTextError, ParamPattern,
    PropertyPattern, ValueSpec, compare_cards, diff_values, match_text, normalize,
};

fn card(json: &str) -> Card {
    serde_json::from_str(json).expect("valid JSON")
}

fn vcard(lines: &[&str]) -> String {
    let mut out = String::from("BEGIN:VCARD\r\n");
    for line in lines {
        out.push_str(line);
        out.push_str("\r\n");
    }
    out.push_str("END:VCARD\r\n");
    out
}

// ---------------------------------------------------------------------------
// Record matching
// ---------------------------------------------------------------------------

#[test]
fn uid_pattern_with_baseline_succeeds() {
    let text = vcard(&["VERSION:4.0", "FN:Jane", "UID:hello@example.com"]);
    let patterns = [PropertyPattern::new("UID", ValueSpec::Any)];
    match_text(&text, &patterns, &MatchConfig::default()).expect("no diagnostics");
}

#[test]
fn unconstrained_property_is_the_only_diagnostic() {
    let text = vcard(&["VERSION:4.0", "FN:Jane", "UID:hello@example.com", "X-FOO:bar"]);
    let Err(MatchTextError::Mismatch(failure)) =
        match_text(&text, &[], &MatchConfig::default())
    else {
        panic!("expected a match failure");
    };
    assert_eq!(failure.diagnostics.len(), 1);
    assert!(matches!(
        &failure.diagnostics[0],
        MatchDiagnostic::Unexpected { property } if property.name == "X-FOO"
    ));
}

#[test]
fn alt_id_values_cannot_be_shared_between_keys() {
    let patterns = [
        PropertyPattern::new("TITLE", "Boss").alt_id("k1"),
        PropertyPattern::new("ROLE", "Chief").alt_id("k2"),
    ];
    let shared = vcard(&[
        "VERSION:4.0",
        "FN:Jane",
        "UID:x",
        "TITLE;ALTID=1:Boss",
        "ROLE;ALTID=1:Chief",
    ]);
    assert!(match_text(&shared, &patterns, &MatchConfig::default()).is_err());

    let distinct = vcard(&[
        "VERSION:4.0",
        "FN:Jane",
        "UID:x",
        "TITLE;ALTID=1:Boss",
        "ROLE;ALTID=2:Chief",
    ]);
    match_text(&distinct, &patterns, &MatchConfig::default()).expect("distinct alt ids");
}

#[test]
fn realistic_record_with_every_value_kind() {
    let text = vcard(&[
        "VERSION:4.0",
        "UID:urn:uuid:03a0e51f-d1aa-4385-8a53-e29025acd8af",
        "FN;DERIVED=TRUE:Mr. John Q. Public\\, Esq.",
        "N:Public;John;Quinlan;Mr.;Esq.",
        "ADR;TYPE=work:;;54321 Oak St;Reston;VA;20190;USA",
        "EMAIL;TYPE=work,pref:jqpublic@example.com",
        "ANNIVERSARY:20191016T011000+0200",
        "item1.X-ABLABEL:blog",
        "item1.URL:https://example.com/blog",
        "JSPROP;JSPTR=\"example.com:foo\":{\"b\":[1\\,2]\\,\"a\":true}",
        "JSPROP;JSPTR=version:\"1.0\"",
    ]);
    let patterns = [
        PropertyPattern::new("FN", ValueSpec::EscapeTolerant("Mr. John Q. Public, Esq.".to_owned()))
            .param(ParamPattern::new("DERIVED", ValueSpec::nocase("true"))),
        PropertyPattern::new(
            "N",
            ValueSpec::components(["Public", "John", "Quinlan", "Mr.", "Esq."]),
        ),
        PropertyPattern::new(
            "ADR",
            ValueSpec::components(["", "", "54321 Oak St", "Reston", "VA", "20190", "USA"]),
        )
        .param(ParamPattern::new("TYPE", "work")),
        PropertyPattern::new("EMAIL", "jqpublic@example.com").param(ParamPattern::new(
            "TYPE",
            ValueSpec::Components(vec![ComponentSpec::set(["pref", "work"])]),
        )),
        PropertyPattern::new(
            "ANNIVERSARY",
            ValueSpec::Timestamp("20191015T231000Z".try_into().expect("timestamp")),
        ),
        PropertyPattern::new("X-ABLABEL", "blog").group_ref("g"),
        PropertyPattern::new("URL", ValueSpec::Any).group_ref("g"),
        PropertyPattern::new(
            "JSPROP",
            ValueSpec::JsonText(r#"{"a":true,"b":[1,2]}"#.try_into().expect("json")),
        )
        .param(ParamPattern::new(
            "JSPTR",
            ValueSpec::QuoteTolerant("example.com:foo".to_owned()),
        )),
        PropertyPattern::new("JSPROP", "\"1.0\"").param(ParamPattern::new("JSPTR", "version")),
    ];
    match_text(&text, &patterns, &MatchConfig::default()).expect("all patterns satisfied");
}

// ---------------------------------------------------------------------------
// Card comparison
// ---------------------------------------------------------------------------

#[test]
fn default_kind_is_elided() {
    assert_eq!(normalize(&card(r#"{"kind": "individual"}"#)), card("{}"));
    assert_eq!(
        normalize(&card(r#"{"kind": "group"}"#)),
        card(r#"{"kind": "group"}"#)
    );
}

#[test]
fn unordered_components_compare_regardless_of_order() {
    let a = card(r#"{"components": [{"value": "b"}, {"value": "a"}], "isOrdered": false}"#);
    let b = card(r#"{"components": [{"value": "a"}, {"value": "b"}], "isOrdered": false}"#);
    assert_eq!(normalize(&a), normalize(&b));
}

#[test]
fn localization_patch_becomes_full_card() {
    let c = card(r#"{"name": {"full": "A"}, "localizations": {"x": {"name/full": "B"}}}"#);
    assert_eq!(
        normalize(&c),
        card(r#"{"name": {"full": "A"}, "localizations": {"x": {"name": {"full": "B"}}}}"#)
    );
}

#[test]
fn differ_reports_missing_and_unexpected() {
    let diffs = diff_values(&card(r#"{"a": 1, "b": 2}"#), &card(r#"{"a": 1, "c": 3}"#));
    let summary: Vec<_> = diffs.iter().map(|d| (d.path.as_str(), d.kind())).collect();
    assert_eq!(
        summary,
        vec![("b", DiffKind::Missing), ("c", DiffKind::Unexpected)]
    );
}

#[test]
fn round_tripped_card_with_converter_noise_matches() {
    let sent = card(
        r#"{"@type": "Card", "version": "1.0", "uid": "x", "kind": "individual",
            "name": {"components": [{"kind": "given", "value": "Jane"}, {"kind": "surname", "value": "Doe"}]},
            "localizations": {"de": {"name/full": "Jana"}}}"#,
    );
    let recovered = card(
        r#"{"@type": "Card", "version": "1.0", "uid": "x", "prodId": "Converter 1.0",
            "created": "2024-01-01T00:00:00Z", "vendor.example:extra": true,
            "name": {"@type": "Name", "components": [
                {"@type": "NameComponent", "kind": "surname", "value": "Doe"},
                {"kind": "given", "value": "Jane"}],
                "vCardParams": {"group": "item1"}},
            "vCardProps": [["version", {}, "text", "4.0"]],
            "localizations": {"de": {"name/full": "Jana"}}}"#,
    );
    compare_cards(&sent, &recovered).expect("equal modulo normalization");
}
