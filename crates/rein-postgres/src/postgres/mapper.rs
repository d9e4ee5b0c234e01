use rein_plan::{PresentConstraints, parse_fingerprint_comment};

use super::queries::RawCheckConstraint;

pub fn map_check_constraints(raw: Vec<RawCheckConstraint>) -> PresentConstraints {
    raw.into_iter()
        .map(|check| {
            let fingerprint = check.comment.as_deref().and_then(parse_fingerprint_comment);
            (check.name, fingerprint)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, comment: Option<&str>) -> RawCheckConstraint {
        RawCheckConstraint {
            name: name.to_string(),
            expression: "CHECK (true)".to_string(),
            comment: comment.map(str::to_string),
        }
    }

    #[test]
    fn fingerprints_come_from_comments() {
        let present = map_check_constraints(vec![
            raw("rein_books_state_incl", Some("rein:0011223344556677")),
            raw("books_isbn_check", Some("legacy")),
            raw("books_year_check", None),
        ]);
        assert_eq!(
            present.get("rein_books_state_incl"),
            Some(Some("0011223344556677"))
        );
        assert_eq!(present.get("books_isbn_check"), Some(None));
        assert_eq!(present.get("books_year_check"), Some(None));
    }
}
