//! Parametrized statement construction.
//!
//! Statements are written as templates where `??` stands for an identifier
//! and `?` for a field-map fragment. Identifiers are escaped and quoted;
//! every value becomes a bound parameter. Caller-supplied text never reaches
//! the statement string unescaped.

use crate::db::{CrudError, CrudResult, FieldMap, Scalar};

/// Statement text plus its positional parameters, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Scalar>,
}

/// Argument substituted for a template placeholder.
#[derive(Debug, Clone, Copy)]
pub enum Param<'a> {
    /// `??`: a table or column name.
    Identifier(&'a str),
    /// `?`: `` `a` = ?, `b` = ? ``
    Assignments(&'a FieldMap),
    /// `?`: `` `a` = ? AND `b` IS NULL ``
    Predicate(&'a FieldMap),
    /// `?`: `` (`a`, `b`) ``
    Columns(&'a FieldMap),
    /// `?`: `(?, ?)`
    Values(&'a FieldMap),
}

/// `SELECT * FROM ??`
pub fn select_all(table: &str) -> CrudResult<Statement> {
    format("SELECT * FROM ??", &[Param::Identifier(table)])
}

/// `SELECT * FROM ?? WHERE ?`
pub fn select_where(table: &str, predicate: &FieldMap) -> CrudResult<Statement> {
    format(
        "SELECT * FROM ?? WHERE ?",
        &[Param::Identifier(table), Param::Predicate(predicate)],
    )
}

/// `INSERT INTO ?? (...) VALUES (...)`
pub fn insert(table: &str, fields: &FieldMap) -> CrudResult<Statement> {
    format(
        "INSERT INTO ?? ? VALUES ?",
        &[
            Param::Identifier(table),
            Param::Columns(fields),
            Param::Values(fields),
        ],
    )
}

/// `UPDATE ?? SET ? WHERE ?`
pub fn update(table: &str, fields: &FieldMap, criteria: &FieldMap) -> CrudResult<Statement> {
    format(
        "UPDATE ?? SET ? WHERE ?",
        &[
            Param::Identifier(table),
            Param::Assignments(fields),
            Param::Predicate(criteria),
        ],
    )
}

/// `DELETE FROM ?? WHERE ?`
pub fn delete(table: &str, criteria: &FieldMap) -> CrudResult<Statement> {
    format(
        "DELETE FROM ?? WHERE ?",
        &[Param::Identifier(table), Param::Predicate(criteria)],
    )
}

/// Substitute `args` into `template`, left to right.
pub fn format(template: &str, args: &[Param<'_>]) -> CrudResult<Statement> {
    let mut sql = String::with_capacity(template.len() + 32);
    let mut params = Vec::new();
    let mut args = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '?' {
            sql.push(c);
            continue;
        }

        let wants_identifier = chars.peek() == Some(&'?');
        if wants_identifier {
            chars.next();
        }

        let arg = args.next().ok_or_else(|| {
            CrudError::invalid_request(format!(
                "template '{}' has more placeholders than arguments",
                template
            ))
        })?;

        match (wants_identifier, arg) {
            (true, Param::Identifier(name)) => sql.push_str(&escape_id(name)?),
            (false, Param::Assignments(fields)) => {
                let parts = non_empty(fields, "SET")?
                    .iter()
                    .map(|(column, value)| {
                        params.push(value.clone());
                        Ok(format!("{} = ?", escape_id(column)?))
                    })
                    .collect::<CrudResult<Vec<_>>>()?;
                sql.push_str(&parts.join(", "));
            }
            (false, Param::Predicate(fields)) => {
                let parts = non_empty(fields, "WHERE")?
                    .iter()
                    .map(|(column, value)| {
                        let column = escape_id(column)?;
                        if value.is_null() {
                            Ok(format!("{} IS NULL", column))
                        } else {
                            params.push(value.clone());
                            Ok(format!("{} = ?", column))
                        }
                    })
                    .collect::<CrudResult<Vec<_>>>()?;
                sql.push_str(&parts.join(" AND "));
            }
            (false, Param::Columns(fields)) => {
                let columns = non_empty(fields, "INSERT")?
                    .keys()
                    .map(|column| escape_id(column))
                    .collect::<CrudResult<Vec<_>>>()?;
                sql.push('(');
                sql.push_str(&columns.join(", "));
                sql.push(')');
            }
            (false, Param::Values(fields)) => {
                let marks = vec!["?"; non_empty(fields, "INSERT")?.len()];
                params.extend(fields.values().cloned());
                sql.push('(');
                sql.push_str(&marks.join(", "));
                sql.push(')');
            }
            (true, _) => {
                return Err(CrudError::invalid_request(
                    "'??' placeholder expects an identifier argument",
                ));
            }
            (false, Param::Identifier(_)) => {
                return Err(CrudError::invalid_request(
                    "'?' placeholder expects a field-map argument",
                ));
            }
        }
    }

    if args.next().is_some() {
        return Err(CrudError::invalid_request(format!(
            "template '{}' has fewer placeholders than arguments",
            template
        )));
    }

    Ok(Statement { sql, params })
}

/// Quote an identifier with backticks, doubling embedded backticks.
///
/// A dotted name is qualified: `db.tasks` becomes `` `db`.`tasks` ``. Backtick
/// quoting is understood by both MySQL and SQLite.
pub fn escape_id(name: &str) -> CrudResult<String> {
    if name.contains('\0') {
        return Err(CrudError::invalid_request(format!(
            "identifier {:?} contains a NUL character",
            name
        )));
    }
    let parts = name
        .split('.')
        .map(|part| {
            if part.is_empty() {
                return Err(CrudError::invalid_request(format!(
                    "identifier {:?} has an empty name part",
                    name
                )));
            }
            Ok(format!("`{}`", part.replace('`', "``")))
        })
        .collect::<CrudResult<Vec<_>>>()?;
    Ok(parts.join("."))
}

fn non_empty<'a>(fields: &'a FieldMap, clause: &str) -> CrudResult<&'a FieldMap> {
    if fields.is_empty() {
        return Err(CrudError::invalid_request(format!(
            "{} clause needs at least one field",
            clause
        )));
    }
    Ok(fields)
}
