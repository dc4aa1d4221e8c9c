//! The `--where` condition language.
//!
//! A condition is a disjunction of conjunctions: groups separated by `|`, each
//! group a list of `field<op>value` clauses separated by `;`. For example:
//!
//! ```txt
//! brand=xiaomi;rating>=4.8|price<=500
//! ```
//!
//! matches goods from brand `xiaomi` rated at least 4.8, and also any goods
//! priced at 500 or less.

use regex::Regex;

use std::{
    fmt::{self, Display},
    sync::LazyLock,
};

use crate::{
    schema::{FieldType, Schema},
    value::{Record, Value},
    Error, Result,
};

static CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)(=|!=|>=|<=|>|<)(.+)$").expect("clause pattern should compile")
});

/// A comparison operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl Operator {
    /// Returns the operator spelled `symbol`, if there is one.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "=" => Self::Eq,
            "!=" => Self::Ne,
            ">" => Self::Gt,
            "<" => Self::Lt,
            ">=" => Self::Ge,
            "<=" => Self::Le,
            _ => return None,
        })
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }

    /// Reports whether the operator can be applied to fields of type `kind`.
    ///
    /// Text fields support only `=` and `!=`.
    #[must_use]
    pub fn supports(self, kind: FieldType) -> bool {
        kind == FieldType::Numeric || matches!(self, Self::Eq | Self::Ne)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single `field<op>value` comparison, with `value` already converted to
/// the field's type.
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: Operator,
    pub value: Value,
}

impl Condition {
    /// Parses one trimmed clause, checking it against `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConditionSyntax`] for a clause that isn't
    /// `field<op>value` or has an empty value, [`Error::UnknownField`] for a
    /// field not in `schema`, [`Error::UnsupportedOperator`] for an ordering
    /// operator on a text field, and [`Error::TypeCoercion`] for a numeric
    /// field compared with something that isn't a number.
    pub fn parse(clause: &str, schema: &Schema) -> Result<Self> {
        let Some(caps) = CLAUSE.captures(clause) else {
            return Err(Error::ConditionSyntax(format!("invalid condition format: {clause}")));
        };
        let field = &caps[1];
        let raw = caps[3].trim();
        if raw.is_empty() {
            return Err(Error::ConditionSyntax(format!(
                "value for field {field} must not be empty"
            )));
        }
        let kind = schema.require(field)?;
        let op = Operator::from_symbol(&caps[2])
            .filter(|op| op.supports(kind))
            .ok_or_else(|| Error::UnsupportedOperator {
                field: field.to_string(),
                op: caps[2].to_string(),
                kind,
            })?;
        let value = match kind {
            FieldType::Numeric => Value::Numeric(raw.parse().map_err(|_| Error::TypeCoercion {
                field: field.to_string(),
                value: raw.to_string(),
            })?),
            FieldType::Text => Value::Text(raw.to_string()),
        };
        Ok(Self {
            field: field.to_string(),
            op,
            value,
        })
    }

    /// Reports whether `record` satisfies this condition.
    ///
    /// Text compares case-insensitively. A record lacking the field, or
    /// holding a value of the other type, never matches.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let Some(actual) = record.get(&self.field) else {
            return false;
        };
        match (actual, &self.value) {
            (Value::Numeric(a), Value::Numeric(b)) => match self.op {
                Operator::Eq => a == b,
                Operator::Ne => a != b,
                Operator::Gt => a > b,
                Operator::Lt => a < b,
                Operator::Ge => a >= b,
                Operator::Le => a <= b,
            },
            (Value::Text(a), Value::Text(b)) => {
                let equal = a.to_lowercase() == b.to_lowercase();
                match self.op {
                    Operator::Eq => equal,
                    Operator::Ne => !equal,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.field, self.op, self.value)
    }
}

/// A parsed condition: any one of its groups must hold, and every condition
/// in that group.
#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    groups: Vec<Vec<Condition>>,
}

impl Expression {
    /// Parses `condition`, checking field names, operators and values
    /// against `schema`.
    ///
    /// Empty clauses and empty groups are dropped, so `a=1;;b=2|` is the same
    /// as `a=1;b=2`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use goods::{Expression, Record, Schema};
    /// let schema = Schema::infer(&["brand", "price"], &["xiaomi", "150"]);
    /// let expr = Expression::parse("brand=XIAOMI|price<=100", &schema).unwrap();
    /// let record = Record::new(vec![
    ///     ("brand".into(), "xiaomi".into()),
    ///     ("price".into(), 150.0.into()),
    /// ]);
    /// assert!(expr.matches(&record));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConditionSyntax`] if `condition` is blank or contains
    /// no clauses at all, or any error from [`Condition::parse`].
    pub fn parse(condition: &str, schema: &Schema) -> Result<Self> {
        let condition = condition.trim();
        if condition.is_empty() {
            return Err(Error::ConditionSyntax("condition must not be empty".to_string()));
        }
        let mut groups = Vec::new();
        for group in condition.split('|') {
            let conditions = group
                .split(';')
                .map(str::trim)
                .filter(|clause| !clause.is_empty())
                .map(|clause| Condition::parse(clause, schema))
                .collect::<Result<Vec<_>>>()?;
            if !conditions.is_empty() {
                groups.push(conditions);
            }
        }
        if groups.is_empty() {
            return Err(Error::ConditionSyntax("no valid conditions found".to_string()));
        }
        Ok(Self { groups })
    }

    /// Reports whether `record` satisfies at least one group.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.groups
            .iter()
            .any(|group| group.iter().all(|c| c.matches(record)))
    }

    pub fn groups(&self) -> &[Vec<Condition>] {
        &self.groups
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            for (j, condition) in group.iter().enumerate() {
                if j > 0 {
                    f.write_str(";")?;
                }
                write!(f, "{condition}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::infer(
            &["name", "brand", "price", "rating"],
            &["iphone", "apple", "100", "4.9"],
        )
    }

    fn good(name: &str, brand: &str, price: f64, rating: f64) -> Record {
        Record::new(vec![
            ("name".into(), name.into()),
            ("brand".into(), brand.into()),
            ("price".into(), price.into()),
            ("rating".into(), rating.into()),
        ])
    }

    fn goods() -> Vec<Record> {
        vec![
            good("iphone", "apple", 100.0, 4.9),
            good("samsung", "samsung", 200.0, 4.6),
            good("xiaomi", "xiaomi", 150.0, 4.8),
        ]
    }

    fn cond(field: &str, op: Operator, value: impl Into<Value>) -> Condition {
        Condition {
            field: field.to_string(),
            op,
            value: value.into(),
        }
    }

    #[test]
    fn parse_fn_builds_or_of_and_groups() {
        let expr = Expression::parse("brand=xiaomi;rating>=4.8|price<=500", &schema()).unwrap();
        assert_eq!(
            expr.groups(),
            &[
                vec![
                    cond("brand", Operator::Eq, "xiaomi"),
                    cond("rating", Operator::Ge, 4.8),
                ],
                vec![cond("price", Operator::Le, 500.0)],
            ]
        );
    }

    #[test]
    fn parse_fn_trims_clauses_and_drops_empty_groups() {
        let expr = Expression::parse(" price > 10 ;; |  | brand != x ", &schema());
        // Whitespace inside a clause isn't allowed between field and operator.
        assert!(matches!(expr, Err(Error::ConditionSyntax(_))));

        let expr = Expression::parse(" price>10 ;; |  | brand!= x ", &schema()).unwrap();
        assert_eq!(expr.to_string(), "price>10|brand!=x");
    }

    #[test]
    fn parse_fn_is_deterministic() {
        let s = "name=iphone;price<150|rating>4.7";
        assert_eq!(
            Expression::parse(s, &schema()).unwrap(),
            Expression::parse(s, &schema()).unwrap()
        );
    }

    #[test]
    fn parse_fn_returns_error_for_empty_condition() {
        for input in ["", "   "] {
            let err = Expression::parse(input, &schema()).unwrap_err();
            assert!(matches!(err, Error::ConditionSyntax(_)), "{input:?}");
            assert_eq!(err.to_string(), "condition must not be empty");
        }
    }

    #[test]
    fn parse_fn_returns_error_when_only_separators_given() {
        let err = Expression::parse(" ; | ; ", &schema()).unwrap_err();
        assert_eq!(err.to_string(), "no valid conditions found");
    }

    #[test]
    fn parse_fn_returns_error_for_bad_clause_format() {
        let err = Expression::parse("name+iphone", &schema()).unwrap_err();
        assert!(matches!(err, Error::ConditionSyntax(_)));
        assert_eq!(err.to_string(), "invalid condition format: name+iphone");
        assert!(matches!(
            Expression::parse("price=", &schema()),
            Err(Error::ConditionSyntax(_))
        ));
    }

    #[test]
    fn parse_fn_returns_error_for_unknown_field() {
        let err = Expression::parse("cost=100", &schema()).unwrap_err();
        let Error::UnknownField { field, allowed } = err else {
            panic!("want UnknownField");
        };
        assert_eq!(field, "cost");
        assert_eq!(allowed, vec!["name", "brand", "price", "rating"]);
    }

    #[test]
    fn parse_fn_returns_error_for_ordering_operator_on_text_field() {
        for input in ["brand>apple", "name<=x", "name>=x", "brand<apple"] {
            assert!(
                matches!(
                    Expression::parse(input, &schema()),
                    Err(Error::UnsupportedOperator {
                        kind: FieldType::Text,
                        ..
                    })
                ),
                "{input}"
            );
        }
    }

    #[test]
    fn parse_fn_returns_error_for_non_numeric_value_on_numeric_field() {
        let err = Expression::parse("price=big", &schema()).unwrap_err();
        assert!(matches!(err, Error::TypeCoercion { .. }));
        assert_eq!(
            err.to_string(),
            r#"field "price" expects a numeric value, got "big""#
        );
    }

    #[test]
    fn field_names_are_case_sensitive() {
        assert!(matches!(
            Expression::parse("Brand=apple", &schema()),
            Err(Error::UnknownField { .. })
        ));
    }

    #[test]
    fn condition_matches_fn_compares_by_type() {
        let iphone = good("iphone", "apple", 100.0, 4.9);
        let cases = [
            ("name=iphone", true),
            ("name=IPhone", true),
            ("brand!=xiaomi", true),
            ("price=100", true),
            ("rating!=4.8", true),
            ("price>10", true),
            ("price>=100", true),
            ("rating<4.99", true),
            ("rating<=4.9", true),
            ("name=1iphone", false),
            ("brand!=APPLE", false),
            ("price=1000", false),
            ("rating!=4.9", false),
            ("price>100", false),
            ("price>=1000", false),
            ("rating<4.7", false),
            ("rating<=4.7", false),
        ];
        for (input, want) in cases {
            let c = Condition::parse(input, &schema()).unwrap();
            assert_eq!(c.matches(&iphone), want, "{input}");
        }
    }

    #[test]
    fn condition_matches_fn_is_false_for_absent_field() {
        let c = cond("colour", Operator::Eq, "red");
        assert!(!c.matches(&good("iphone", "apple", 100.0, 4.9)));
    }

    #[test]
    fn expression_matches_fn_agrees_with_plain_boolean_logic() {
        type Check = fn(&str, &str, f64, f64) -> bool;
        let cases: [(&str, Check); 4] = [
            ("brand=xiaomi;rating>=4.8|price<=500", |_, b, p, r| {
                (b == "xiaomi" && r >= 4.8) || p <= 500.0
            }),
            ("price>120;price<180", |_, _, p, _| p > 120.0 && p < 180.0),
            ("rating<4.7|name=IPHONE", |n, _, _, r| r < 4.7 || n == "iphone"),
            ("brand!=apple;brand!=samsung", |_, b, _, _| {
                b != "apple" && b != "samsung"
            }),
        ];
        let raw = [
            ("iphone", "apple", 100.0, 4.9),
            ("samsung", "samsung", 200.0, 4.6),
            ("xiaomi", "xiaomi", 150.0, 4.8),
            ("pixel", "google", 700.0, 4.7),
        ];
        for (input, check) in cases {
            let expr = Expression::parse(input, &schema()).unwrap();
            for (n, b, p, r) in raw {
                assert_eq!(
                    expr.matches(&good(n, b, p, r)),
                    check(n, b, p, r),
                    "{input} on {n}"
                );
            }
        }
    }

    #[test]
    fn expression_selects_goods_matching_any_group() {
        let expr = Expression::parse("brand=xiaomi;rating>=4.8|price<=500", &schema()).unwrap();
        let hits: Vec<_> = goods().into_iter().filter(|g| expr.matches(g)).collect();
        // Every sample price is within 500, so all three match the second group.
        assert_eq!(hits.len(), 3);

        let expr = Expression::parse("brand=xiaomi;rating>=4.8|price<=100", &schema()).unwrap();
        let names: Vec<_> = goods()
            .into_iter()
            .filter(|g| expr.matches(g))
            .map(|g| g.get("name").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["iphone", "xiaomi"]);
    }
}
