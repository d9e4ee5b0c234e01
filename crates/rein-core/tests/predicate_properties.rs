use rein_core::{
    Condition, ConditionalRule, Dialect, FormatRule, InclusionRule, LengthRule, Literal, Namer,
    RangeRule, Row, Rule, RuleKind, RuleSpec, build_predicate, check_passes, compile,
};

fn rule(spec: RuleSpec) -> Rule {
    spec.build().expect("valid rule")
}

fn accepts(rule: &Rule, row: &Row) -> bool {
    let expr = build_predicate(rule, &Dialect::postgres()).expect("compiles");
    check_passes(&expr, row).expect("evaluates")
}

fn month(value: i64) -> Row {
    Row::new().with("published_month", value)
}

#[test]
fn range_bounds_respect_inclusivity() {
    for (min_inclusive, max_inclusive) in [(true, true), (true, false), (false, true), (false, false)]
    {
        let rule = rule(RuleSpec::new(
            RangeRule::between(1, 12).inclusive(min_inclusive, max_inclusive),
            ["published_month"],
        ));
        assert_eq!(accepts(&rule, &month(1)), min_inclusive);
        assert_eq!(accepts(&rule, &month(12)), max_inclusive);
        assert!(accepts(&rule, &month(6)));
    }
}

fn every_kind() -> Vec<RuleSpec> {
    vec![
        RuleSpec::new(RangeRule::between(1, 12), ["a"]),
        RuleSpec::new(RuleKind::even(), ["a"]),
        RuleSpec::new(RuleKind::presence(), ["a"]),
        RuleSpec::new(LengthRule::between(1, 5), ["a"]),
        RuleSpec::new(InclusionRule::of(["x", "y"]), ["a"]),
        RuleSpec::new(FormatRule::accepts("[a-z]+"), ["a"]),
        RuleSpec::new(RangeRule::at_least(0), ["a", "b"]),
        RuleSpec::new(LengthRule::at_most(3), ["a", "b"]),
    ]
}

#[test]
fn allow_null_accepts_all_null_targets() {
    for spec in every_kind() {
        let rule = rule(spec.allow_null(true));
        assert!(accepts(&rule, &Row::new()), "{} rejected NULL", rule.describe());
    }
}

#[test]
fn disallowed_null_is_rejected_in_any_target_column() {
    let samples = [
        Row::new().with("b", 2),
        Row::new().with("b", "x"),
        Row::new().with("a", 2),
        Row::new().with("a", "x"),
        Row::new(),
    ];
    for spec in every_kind() {
        let rule = rule(spec);
        for row in &samples {
            let missing = rule.target().iter().any(|column| row.get(column).is_none());
            if missing {
                assert!(
                    !accepts(&rule, row),
                    "{} accepted {row:?} with a NULL target",
                    rule.describe()
                );
            }
        }
    }
}

#[test]
fn compilation_is_deterministic() {
    let dialect = Dialect::postgres();
    let namer = Namer::with_default_prefix(&dialect).expect("prefix fits");
    for spec in every_kind() {
        let first = rule(spec.clone());
        let second = rule(spec);
        assert_eq!(
            compile(&first, &dialect).expect("compiles").sql,
            compile(&second, &dialect).expect("compiles").sql
        );
        assert_eq!(namer.name_for("books", &first), namer.name_for("books", &second));
    }
}

#[test]
fn names_fit_identifier_limit() {
    let dialect = Dialect::postgres();
    let namer = Namer::with_default_prefix(&dialect).expect("prefix fits");
    for len in [1, 10, 40, 63, 64, 200, 1000] {
        let table = "b".repeat(len);
        let rule = rule(RuleSpec::new(
            ConditionalRule::when(Condition::equals("s".repeat(len), "on")),
            ["d".repeat(len), "e".repeat(len)],
        ));
        let name = namer.name_for(&table, &rule);
        assert!(
            name.as_str().len() <= dialect.max_identifier_len,
            "{name} exceeds the identifier limit"
        );
    }
}

#[test]
fn published_month_must_be_a_calendar_month() {
    let rule = rule(RuleSpec::new(RangeRule::between(1, 12), ["published_month"]));
    assert!(!accepts(&rule, &month(0)));
    assert!(!accepts(&rule, &month(13)));
    assert!(accepts(&rule, &month(1)));
    assert!(accepts(&rule, &month(12)));
    assert!(!accepts(&rule, &Row::new().with_null("published_month")));
}

#[test]
fn due_date_is_required_while_on_loan() {
    let rule = rule(RuleSpec::new(
        ConditionalRule::when(Condition::equals("state", "on_loan")),
        ["due_date"],
    ));
    assert!(!accepts(&rule, &Row::new().with("state", "on_loan").with_null("due_date")));
    assert!(accepts(&rule, &Row::new().with("state", "available").with_null("due_date")));
    assert!(accepts(
        &rule,
        &Row::new().with("state", "on_loan").with("due_date", "2026-11-01")
    ));
    assert!(accepts(&rule, &Row::new()));
}

#[test]
fn holder_is_required_and_not_blank_while_on_hold() {
    let rule = rule(RuleSpec::new(
        ConditionalRule::when(Condition::equals("state", "on_hold")).reject_blank(),
        ["holder"],
    ));
    assert!(!accepts(&rule, &Row::new().with("state", "on_hold")));
    assert!(!accepts(&rule, &Row::new().with("state", "on_hold").with("holder", "")));
    assert!(accepts(
        &rule,
        &Row::new().with("state", "on_hold").with("holder", "Jane Citizen")
    ));
}

#[test]
fn call_number_length_is_bounded() {
    let rule = rule(RuleSpec::new(LengthRule::between(1, 255), ["call_number"]).allow_null(true));
    let call_number = |value: String| Row::new().with("call_number", value);
    assert!(!accepts(&rule, &call_number(String::new())));
    assert!(accepts(&rule, &Row::new()));
    assert!(!accepts(&rule, &call_number("K".repeat(256))));
    assert!(accepts(&rule, &call_number("K".to_string())));
    assert!(accepts(&rule, &call_number("KF8840 .F72 1999".to_string())));
}

#[test]
fn title_is_restricted_to_ascii_words() {
    let rule = rule(RuleSpec::new(
        FormatRule::accepts(r"[A-Za-z0-9][A-Za-z0-9 \t]*"),
        ["title"],
    ));
    let title = |value: &str| Row::new().with("title", value);
    assert!(!accepts(&rule, &title("&")));
    assert!(!accepts(&rule, &title("\tOn the Origin of Species")));
    assert!(accepts(&rule, &title("On the Origin of Species")));
}

#[test]
fn state_must_be_a_known_value() {
    let rule = rule(RuleSpec::new(
        InclusionRule::of(["available", "on_loan", "on_hold"]),
        ["state"],
    ));
    assert!(!accepts(&rule, &Row::new().with("state", "burned")));
    assert!(accepts(&rule, &Row::new().with("state", "available")));
}

#[test]
fn adversarial_literals_stay_inside_the_string() {
    let rule = rule(RuleSpec::new(
        InclusionRule::of(["x'); DROP TABLE books; --"]),
        ["state"],
    ));
    let sql = compile(&rule, &Dialect::postgres()).expect("compiles").sql;
    assert_eq!(
        sql,
        "state IS NOT NULL AND state IN ('x''); DROP TABLE books; --')"
    );
    assert!(accepts(
        &rule,
        &Row::new().with("state", Literal::from("x'); DROP TABLE books; --"))
    ));
}

#[test]
fn format_alternation_matches_whole_value() {
    let rule = rule(RuleSpec::new(FormatRule::accepts("^[a-z]+|[0-9]+$"), ["code"]));
    for (value, expected) in [("abc", true), ("123", true), ("abc!!!", false), ("!!!123", false)] {
        let row = Row::new().with("code", value);
        assert_eq!(accepts(&rule, &row), expected, "{value}");
    }
}
