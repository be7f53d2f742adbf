//! Renders typed filters into SQL with bound parameters.

use sqlx::{Postgres, QueryBuilder};

use crate::query::filter::{FieldKind, Filter, FilterField, Predicate, Scalar};

/// Appends ` AND <condition>` for every clause of `filter`, qualifying columns
/// with `alias`. The caller must already have opened a `WHERE` clause.
pub fn push_filter<F: FilterField>(
    builder: &mut QueryBuilder<'_, Postgres>,
    filter: &Filter<F>,
    alias: &str,
) {
    for clause in filter.clauses() {
        let column = format!("{alias}.{}", clause.field.column());
        let is_set = clause.field.kind() == FieldKind::TextSet;

        match &clause.predicate {
            Predicate::Eq(value) if is_set => {
                builder.push(" AND ");
                push_scalar(builder, value);
                builder.push(format!(" = ANY({column})"));
            }
            Predicate::Eq(value) => {
                builder.push(format!(" AND {column} = "));
                push_scalar(builder, value);
            }
            Predicate::In(values) if is_set => {
                builder.push(format!(" AND {column} && ARRAY["));
                push_list(builder, values);
                builder.push("]::text[]");
            }
            Predicate::In(values) => {
                builder.push(format!(" AND {column} IN ("));
                push_list(builder, values);
                builder.push(")");
            }
            Predicate::Contains(needle) => {
                builder.push(format!(" AND {column} ILIKE "));
                builder.push_bind(format!("%{}%", escape_like(needle)));
            }
            Predicate::Compare(ops) => {
                for (op, value) in ops {
                    builder.push(format!(" AND {column} {} ", op.sql()));
                    push_scalar(builder, value);
                }
            }
        }
    }
}

fn push_list(builder: &mut QueryBuilder<'_, Postgres>, values: &[Scalar]) {
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            builder.push(", ");
        }
        push_scalar(builder, value);
    }
}

fn push_scalar(builder: &mut QueryBuilder<'_, Postgres>, value: &Scalar) {
    match value {
        Scalar::Text(v) => builder.push_bind(v.clone()),
        Scalar::Integer(v) => builder.push_bind(*v),
        Scalar::Timestamp(v) => builder.push_bind(*v),
        Scalar::Boolean(v) => builder.push_bind(*v),
        Scalar::Uuid(v) => builder.push_bind(*v),
    };
}

/// Escapes `LIKE` wildcards so the needle matches literally.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
