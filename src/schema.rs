//! Structural validation of a record document before it is decoded.
//!
//! Serde alone reports the first failure without saying which release or
//! which nested field it came from, so each document is walked against a
//! static field table first. Only documents that pass are handed to serde.

use log::warn;
use strum::VariantNames;
use toml::{value::Table, Value};

use crate::{
    error::{Error, Result},
    record::{parse_date, parse_timestamp, ChangeType},
};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Kind {
    Str,
    Bool,
    /// `YYYY-MM-DD`
    Date,
    /// `YYYY-MM-DD HH:MM:SS UTC`
    Timestamp,
    /// 40 hex chars
    Sha,
    /// Integer >= 0
    Count,
    /// Integer > 0
    PrNumber,
    /// A string drawn from a fixed set
    OneOf(&'static [&'static str]),
    /// Strings without duplicates
    Scopes,
    List(&'static Kind),
    Tables(&'static [Field]),
}

impl Kind {
    fn expected(&self) -> &'static str {
        match self {
            Kind::Str | Kind::Date | Kind::Timestamp | Kind::Sha | Kind::OneOf(_) => "string",
            Kind::Bool => "boolean",
            Kind::Count | Kind::PrNumber => "integer",
            Kind::Scopes | Kind::List(_) => "array",
            Kind::Tables(_) => "array of tables",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Field {
    name: &'static str,
    kind: Kind,
    required: bool,
}

impl Field {
    const fn req(name: &'static str, kind: Kind) -> Self {
        Field {
            name,
            kind,
            required: true,
        }
    }

    const fn opt(name: &'static str, kind: Kind) -> Self {
        Field {
            name,
            kind,
            required: false,
        }
    }
}

const WHATS_NEXT: &[Field] = &[
    Field::req("title", Kind::Str),
    Field::req("description", Kind::Str),
];

const CHANGELOG: &[Field] = &[
    Field::req("type", Kind::OneOf(ChangeType::VARIANTS)),
    Field::opt("scopes", Kind::Scopes),
    Field::req("description", Kind::Str),
    Field::opt("pr_numbers", Kind::List(&Kind::PrNumber)),
    Field::opt("contributors", Kind::List(&Kind::Str)),
];

const COMMIT: &[Field] = &[
    Field::req("sha", Kind::Sha),
    Field::req("date", Kind::Timestamp),
    Field::req("description", Kind::Str),
    Field::req("pr_number", Kind::PrNumber),
    Field::req("scopes", Kind::Scopes),
    Field::req("type", Kind::OneOf(ChangeType::VARIANTS)),
    Field::req("breaking_change", Kind::Bool),
    Field::req("author", Kind::Str),
    Field::req("files_count", Kind::Count),
    Field::req("insertions_count", Kind::Count),
    Field::req("deletions_count", Kind::Count),
];

pub(crate) const RELEASE: &[Field] = &[
    Field::req("date", Kind::Date),
    Field::opt("codename", Kind::Str),
    Field::opt("description", Kind::Str),
    Field::opt("known_issues", Kind::List(&Kind::Str)),
    Field::opt("vrl_changelog", Kind::Str),
    Field::req("whats_next", Kind::Tables(WHATS_NEXT)),
    Field::opt("changelog", Kind::Tables(CHANGELOG)),
    Field::req("commits", Kind::Tables(COMMIT)),
];

/// Walks one release document, reporting the first violation found
pub(crate) struct Checker<'a> {
    version: &'a str,
    deny_unknown_fields: bool,
}

impl<'a> Checker<'a> {
    pub(crate) fn new(version: &'a str, deny_unknown_fields: bool) -> Self {
        Checker {
            version,
            deny_unknown_fields,
        }
    }

    /// Checks a top level release table
    pub(crate) fn check_release(&self, table: &Table) -> Result<()> {
        self.check_table("", table, RELEASE)
    }

    fn check_table(&self, path: &str, table: &Table, fields: &[Field]) -> Result<()> {
        for field in fields {
            let path = join(path, field.name);
            match table.get(field.name) {
                Some(value) => self.check_value(&path, value, &field.kind)?,
                None if field.required => {
                    return Err(Error::MissingField {
                        version: self.version.to_owned(),
                        field: path,
                    })
                }
                None => {}
            }
        }

        for key in table.keys() {
            if fields.iter().any(|f| f.name == key) {
                continue;
            }
            let path = join(path, key);
            if self.deny_unknown_fields {
                return Err(Error::UnknownField {
                    version: self.version.to_owned(),
                    field: path,
                });
            }
            warn!("release {}: ignoring unknown field `{}`", self.version, path);
        }

        Ok(())
    }

    fn check_value(&self, path: &str, value: &Value, kind: &Kind) -> Result<()> {
        match (kind, value) {
            (Kind::Str, Value::String(_)) | (Kind::Bool, Value::Boolean(_)) => Ok(()),
            (Kind::Date, Value::String(s)) => parse_date(s)
                .map(|_| ())
                .map_err(|e| self.invalid(path, format!("is not a YYYY-MM-DD date: {e}"))),
            (Kind::Timestamp, Value::String(s)) => parse_timestamp(s).map(|_| ()).map_err(|e| {
                self.invalid(path, format!("is not a `YYYY-MM-DD HH:MM:SS UTC` timestamp: {e}"))
            }),
            (Kind::Sha, Value::String(s)) => {
                if regex!(r"^[0-9a-fA-F]{40}$").is_match(s) {
                    Ok(())
                } else {
                    Err(self.invalid(path, format!("{s:?} is not a 40 character hex hash")))
                }
            }
            (Kind::Count, Value::Integer(n)) => {
                if *n >= 0 {
                    Ok(())
                } else {
                    Err(self.invalid(path, format!("must not be negative, found {n}")))
                }
            }
            (Kind::PrNumber, Value::Integer(n)) => {
                if *n > 0 {
                    Ok(())
                } else {
                    Err(self.invalid(path, format!("must be a positive integer, found {n}")))
                }
            }
            (Kind::OneOf(allowed), Value::String(s)) => {
                if allowed.contains(&s.as_str()) {
                    Ok(())
                } else {
                    Err(self.invalid(
                        path,
                        format!("has unknown value {s:?}, expected one of: {}", allowed.join(", ")),
                    ))
                }
            }
            (Kind::Scopes, Value::Array(items)) => {
                let mut seen: Vec<&str> = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{i}]");
                    let Value::String(scope) = item else {
                        return Err(self.mismatch(&item_path, "string", item));
                    };
                    if seen.contains(&scope.as_str()) {
                        return Err(self.invalid(path, format!("lists scope {scope:?} twice")));
                    }
                    seen.push(scope);
                }
                Ok(())
            }
            (Kind::List(inner), Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    self.check_value(&format!("{path}[{i}]"), item, inner)?;
                }
                Ok(())
            }
            (Kind::Tables(fields), Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{i}]");
                    match item {
                        Value::Table(t) => self.check_table(&item_path, t, fields)?,
                        other => return Err(self.mismatch(&item_path, "table", other)),
                    }
                }
                Ok(())
            }
            (kind, other) => Err(self.mismatch(path, kind.expected(), other)),
        }
    }

    fn invalid(&self, path: &str, reason: String) -> Error {
        Error::InvalidField {
            version: self.version.to_owned(),
            field: path.to_owned(),
            reason,
        }
    }

    fn mismatch(&self, path: &str, expected: &'static str, found: &Value) -> Error {
        Error::TypeMismatch {
            version: self.version.to_owned(),
            field: path.to_owned(),
            expected,
            found: found.type_str(),
        }
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_owned()
    } else {
        format!("{path}.{name}")
    }
}
