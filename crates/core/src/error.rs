//! Error types for Quarry.
//!
//! Every error carries an [`ErrorKind`] so callers can branch on the class of
//! failure (for example telling a bad bind apart from a constraint violation)
//! without matching on individual variants.

use crate::types::DataType;
use crate::value::Value;
use alloc::string::String;
use core::fmt;

/// Result type alias for Quarry operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value's type disagrees with a column or index key type.
    Data,
    /// A query is malformed: unbound placeholders, bad arity, bad bind type.
    Syntax,
    /// A schema-level invariant such as uniqueness would be violated.
    Constraint,
    /// A table, column, index or row does not exist.
    NotFound,
    /// The operation is not valid in the current state.
    InvalidOperation,
    /// The owning transaction was aborted.
    Aborted,
    /// The backstore failed while reading or flushing.
    Storage,
}

/// Error types for Quarry operations.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Type mismatch between a value and the column/key it targets.
    TypeMismatch {
        expected: DataType,
        got: Option<DataType>,
    },
    /// Generic data error.
    Data { message: String },
    /// Malformed query or binding.
    Syntax { message: String },
    /// Null constraint violation.
    NullConstraint { column: String },
    /// Unique constraint violation.
    UniqueConstraint { index: String, value: Value },
    /// Invalid schema definition.
    InvalidSchema { message: String },
    /// Column not found.
    ColumnNotFound { table: String, column: String },
    /// Table not found.
    TableNotFound { name: String },
    /// Index not found.
    IndexNotFound { table: String, index: String },
    /// Invalid operation.
    InvalidOperation { message: String },
    /// Transaction aborted.
    Aborted { transaction: u64 },
    /// Backstore failure.
    Storage { message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TypeMismatch { expected, got } => match got {
                Some(got) => write!(f, "Type mismatch: expected {:?}, got {:?}", expected, got),
                None => write!(f, "Type mismatch: expected {:?}, got null", expected),
            },
            Error::Data { message } => write!(f, "Data error: {}", message),
            Error::Syntax { message } => write!(f, "Syntax error: {}", message),
            Error::NullConstraint { column } => {
                write!(f, "Null constraint violation on column: {}", column)
            }
            Error::UniqueConstraint { index, value } => {
                write!(f, "Unique constraint violation on index {}: {:?}", index, value)
            }
            Error::InvalidSchema { message } => write!(f, "Invalid schema: {}", message),
            Error::ColumnNotFound { table, column } => {
                write!(f, "Column {} not found in table {}", column, table)
            }
            Error::TableNotFound { name } => write!(f, "Table not found: {}", name),
            Error::IndexNotFound { table, index } => {
                write!(f, "Index {} not found in table {}", index, table)
            }
            Error::InvalidOperation { message } => write!(f, "Invalid operation: {}", message),
            Error::Aborted { transaction } => write!(f, "Transaction {} aborted", transaction),
            Error::Storage { message } => write!(f, "Storage error: {}", message),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl Error {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TypeMismatch { .. } | Error::Data { .. } => ErrorKind::Data,
            Error::Syntax { .. } => ErrorKind::Syntax,
            Error::NullConstraint { .. }
            | Error::UniqueConstraint { .. }
            | Error::InvalidSchema { .. } => ErrorKind::Constraint,
            Error::ColumnNotFound { .. }
            | Error::TableNotFound { .. }
            | Error::IndexNotFound { .. } => ErrorKind::NotFound,
            Error::InvalidOperation { .. } => ErrorKind::InvalidOperation,
            Error::Aborted { .. } => ErrorKind::Aborted,
            Error::Storage { .. } => ErrorKind::Storage,
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: DataType, got: Option<DataType>) -> Self {
        Error::TypeMismatch { expected, got }
    }

    /// Creates a data error.
    pub fn data(message: impl Into<String>) -> Self {
        Error::Data {
            message: message.into(),
        }
    }

    /// Creates a syntax error.
    pub fn syntax(message: impl Into<String>) -> Self {
        Error::Syntax {
            message: message.into(),
        }
    }

    /// Creates a null constraint error.
    pub fn null_constraint(column: impl Into<String>) -> Self {
        Error::NullConstraint {
            column: column.into(),
        }
    }

    /// Creates a unique constraint error.
    pub fn unique_constraint(index: impl Into<String>, value: Value) -> Self {
        Error::UniqueConstraint {
            index: index.into(),
            value,
        }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates a column not found error.
    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::ColumnNotFound {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Creates a table not found error.
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Error::TableNotFound { name: name.into() }
    }

    /// Creates an index not found error.
    pub fn index_not_found(table: impl Into<String>, index: impl Into<String>) -> Self {
        Error::IndexNotFound {
            table: table.into(),
            index: index.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates an aborted-transaction error.
    pub fn aborted(transaction: u64) -> Self {
        Error::Aborted { transaction }
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Error::Storage {
            message: message.into(),
        }
    }
}
