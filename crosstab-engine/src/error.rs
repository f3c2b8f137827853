//! FILENAME: crosstab-engine/src/error.rs

use thiserror::Error;

use crate::rows::RowSetKind;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("definition binds no {role} field for {collection} rows")]
    MissingBinding {
        collection: RowSetKind,
        role: &'static str,
    },

    #[error("non-numeric value \"{value}\" in {collection} row {index}, field \"{field}\"")]
    NonNumericField {
        collection: RowSetKind,
        index: usize,
        field: String,
        value: String,
    },
}
