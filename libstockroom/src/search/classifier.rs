use chrono::NaiveDate;
use derive_more::Display;
use enum_iterator::Sequence;

use crate::dates::DateParser;
use crate::table::model::parse_number;

/// The tier a global search query falls into.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum QueryKind {
    #[display("date {_0}")]
    Date(NaiveDate),
    #[display("number {_0}")]
    Numeric(f64),
    #[display("email {_0:?}")]
    Email(String),
    #[display("text {_0:?}")]
    Text(String),
}

/// Classifier tiers in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Sequence)]
enum Tier {
    Date,
    Numeric,
    Email,
}

type Predicate = fn(&TypeClassifier, &str) -> Option<QueryKind>;

impl Tier {
    fn predicate(self) -> Predicate {
        match self {
            Tier::Date => |classifier, query| classifier.dates.parse(query).map(QueryKind::Date),
            Tier::Numeric => |_, query| parse_number(query).map(QueryKind::Numeric),
            Tier::Email => |_, query| {
                (query.contains('@') && query.contains('.'))
                    .then(|| QueryKind::Email(query.to_string()))
            },
        }
    }
}

/// Assigns a query to exactly one [`QueryKind`]. Tiers are tried as date,
/// numeric, email and the first hit wins; everything else is text.
#[derive(Debug, Clone, Default)]
pub struct TypeClassifier {
    dates: DateParser,
}

impl TypeClassifier {
    #[must_use]
    pub fn new(dates: DateParser) -> Self {
        Self { dates }
    }

    #[must_use]
    pub fn date_parser(&self) -> &DateParser {
        &self.dates
    }

    #[must_use]
    pub fn classify(&self, query: &str) -> QueryKind {
        enum_iterator::all::<Tier>()
            .find_map(|tier| tier.predicate()(self, query))
            .unwrap_or_else(|| QueryKind::Text(query.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(query: &str) -> QueryKind {
        TypeClassifier::default().classify(query)
    }

    #[test]
    fn year_is_a_date_before_a_number() {
        assert_eq!(
            classify("2024"),
            QueryKind::Date(NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"))
        );
        assert_eq!(
            classify(" 2024-03-05 "),
            QueryKind::Date(NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date"))
        );
    }

    #[test]
    fn numbers_fall_through_from_dates() {
        assert_eq!(classify("42"), QueryKind::Numeric(42.0));
        assert_eq!(classify(" 3.5 "), QueryKind::Numeric(3.5));
        assert_eq!(classify("-7"), QueryKind::Numeric(-7.0));
        assert_eq!(classify("NaN"), QueryKind::Text("NaN".into()));
    }

    #[test]
    fn infinity_spellings_are_text() {
        for query in ["inf", "Inf", "INFINITY", "+inf", "-infinity"] {
            assert_eq!(classify(query), QueryKind::Text(query.into()), "{query}");
        }
        assert_eq!(classify("1e400"), QueryKind::Text("1e400".into()));
    }

    #[test]
    fn email_needs_at_sign_and_dot() {
        assert_eq!(
            classify("ops@acme.io"),
            QueryKind::Email("ops@acme.io".into())
        );
        assert_eq!(classify("ops@acme"), QueryKind::Text("ops@acme".into()));
    }

    #[test]
    fn everything_else_is_text() {
        assert_eq!(classify("hex bolt"), QueryKind::Text("hex bolt".into()));
        assert_eq!(classify("12 pcs"), QueryKind::Text("12 pcs".into()));
        assert_eq!(classify(""), QueryKind::Text(String::new()));
    }

    #[test]
    fn configured_formats_decide_what_is_a_date() {
        let classifier = TypeClassifier::new(DateParser::with_formats(vec!["%d/%m/%Y".into()]));
        assert_eq!(
            classifier.classify("05/03/2024"),
            QueryKind::Date(NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date"))
        );
        assert_eq!(classifier.classify("3.5"), QueryKind::Numeric(3.5));
    }
}
