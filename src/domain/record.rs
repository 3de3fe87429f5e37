//! The nested record shape a [`Forest`] is serialized as.
//!
//! Every tree becomes
//!
//! ```json
//! { "employee": { "id": "...", "direct_reports": [ ... ] } }
//! ```
//!
//! with `direct_reports` holding records of the same shape. The views here
//! only implement [`Serialize`]; the encoding (JSON, YAML, ...) is left to the
//! writer.

use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};

use super::{Employee, Forest};

/// The key the identifier is written under unless configured otherwise.
pub const DEFAULT_IDENTIFIER_KEY: &str = "id";

/// Serializable view of a whole forest: a sequence of [`Record`]s in root
/// order.
#[derive(Debug, Clone, Copy)]
pub struct Records<'a> {
    forest: &'a Forest,
    key: &'a str,
}

impl<'a> Records<'a> {
    /// Writes identifiers under `key` instead of [`DEFAULT_IDENTIFIER_KEY`].
    #[must_use]
    pub const fn with_identifier_key(mut self, key: &'a str) -> Self {
        self.key = key;
        self
    }

    /// Number of levels in the deepest tree.
    ///
    /// Serializers recurse once per level, so callers can bound this before
    /// encoding.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.forest.depth()
    }

    /// Iterates the per-root records.
    pub fn iter(&self) -> impl Iterator<Item = Record<'a>> + 'a {
        let key = self.key;
        self.forest
            .roots()
            .iter()
            .map(move |employee| Record { employee, key })
    }
}

/// Serializable view of one employee and their reports.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    employee: &'a Employee,
    key: &'a str,
}

impl<'a> Record<'a> {
    /// A record for `employee` using [`DEFAULT_IDENTIFIER_KEY`].
    #[must_use]
    pub const fn new(employee: &'a Employee) -> Self {
        Self {
            employee,
            key: DEFAULT_IDENTIFIER_KEY,
        }
    }
}

struct Body<'a>(Record<'a>);

impl Serialize for Records<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.forest.roots().len()))?;
        for record in self.iter() {
            seq.serialize_element(&record)?;
        }
        seq.end()
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("employee", &Body(*self))?;
        map.end()
    }
}

impl Serialize for Body<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Record { employee, key } = self.0;
        let reports = Reports {
            reports: employee.direct_reports(),
            key,
        };

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(key, employee.id())?;
        map.serialize_entry("direct_reports", &reports)?;
        map.end()
    }
}

struct Reports<'a> {
    reports: &'a [Employee],
    key: &'a str,
}

impl Serialize for Reports<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.reports.len()))?;
        for employee in self.reports {
            seq.serialize_element(&Record {
                employee,
                key: self.key,
            })?;
        }
        seq.end()
    }
}

impl Forest {
    /// The serializable records of this forest, one per root.
    #[must_use]
    pub const fn records(&self) -> Records<'_> {
        Records {
            forest: self,
            key: DEFAULT_IDENTIFIER_KEY,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{Hierarchy, Identifier, Relation};

    fn forest(pairs: &[(&str, Option<&str>)]) -> Forest {
        let relations = pairs.iter().map(|(employee, manager)| Relation {
            id: Identifier::try_from(*employee).unwrap(),
            manager: manager.map(|m| Identifier::try_from(m).unwrap()),
        });
        Hierarchy::new(relations).build().unwrap()
    }

    #[test]
    fn nested_record_shape() {
        let forest = forest(&[
            ("a", None),
            ("b", Some("a")),
            ("c", Some("a")),
            ("d", Some("b")),
        ]);

        let value = serde_json::to_value(forest.records()).unwrap();

        assert_eq!(
            value,
            json!([
                {
                    "employee": {
                        "id": "a",
                        "direct_reports": [
                            {
                                "employee": {
                                    "id": "b",
                                    "direct_reports": [
                                        { "employee": { "id": "d", "direct_reports": [] } }
                                    ]
                                }
                            },
                            { "employee": { "id": "c", "direct_reports": [] } }
                        ]
                    }
                }
            ])
        );
    }

    #[test]
    fn one_record_per_root() {
        let forest = forest(&[("x", None), ("y", None)]);

        let value = serde_json::to_value(forest.records()).unwrap();

        assert_eq!(
            value,
            json!([
                { "employee": { "id": "x", "direct_reports": [] } },
                { "employee": { "id": "y", "direct_reports": [] } }
            ])
        );
        assert_eq!(forest.records().iter().count(), 2);
        assert_eq!(forest.records().depth(), 1);
    }

    #[test]
    fn custom_identifier_key() {
        let forest = forest(&[("boss@example.com", None)]);

        let json =
            serde_json::to_string(&forest.records().with_identifier_key("email")).unwrap();

        assert_eq!(
            json,
            r#"[{"employee":{"email":"boss@example.com","direct_reports":[]}}]"#
        );
    }

    #[test]
    fn identifier_precedes_reports() {
        let forest = forest(&[("a", None)]);
        let json = serde_json::to_string(&forest.records()).unwrap();
        assert_eq!(json, r#"[{"employee":{"id":"a","direct_reports":[]}}]"#);
    }

    #[test]
    fn empty_forest_is_empty_sequence() {
        let forest = forest(&[("m", Some("ghost"))]);
        assert_eq!(serde_json::to_string(&forest.records()).unwrap(), "[]");
    }

    #[test]
    fn serializing_twice_is_identical() {
        let forest = forest(&[("a", None), ("b", Some("a")), ("c", Some("b"))]);

        let first = serde_json::to_string_pretty(&forest.records()).unwrap();
        let second = serde_json::to_string_pretty(&forest.records()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_record_view() {
        let forest = forest(&[("a", None), ("b", Some("a"))]);
        let record = Record::new(&forest.roots()[0].direct_reports()[0]);

        assert_eq!(
            serde_json::to_value(record).unwrap(),
            json!({ "employee": { "id": "b", "direct_reports": [] } })
        );
    }
}
