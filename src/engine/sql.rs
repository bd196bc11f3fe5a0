//! SQL text helpers

use crate::tables::ColumnDef;

/// Single-quoted string literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Double-quoted identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `{'name': 'TYPE', ...}` as taken by `read_json(columns = ...)`
pub fn columns_struct(columns: &[ColumnDef]) -> String {
    let fields: Vec<String> = columns
        .iter()
        .map(|(name, sql_type)| format!("{}: {}", quote_literal(name), quote_literal(sql_type)))
        .collect();
    format!("{{{}}}", fields.join(", "))
}

/// `{'name': TYPE, ...}` as taken by `read_parquet(hive_types = ...)`
pub fn types_struct(columns: &[ColumnDef]) -> String {
    let fields: Vec<String> = columns
        .iter()
        .map(|(name, sql_type)| format!("{}: {sql_type}", quote_literal(name)))
        .collect();
    format!("{{{}}}", fields.join(", "))
}
