//! Method and trailing segment to CRUD operation.

use crate::error::AppError;
use crate::extractors::last_segment;
use axum::http::{Method, Uri};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::List => "list",
        };
        f.write_str(name)
    }
}

/// Picks the operation for an inbound request.
pub type Mux = fn(&Method, &Uri) -> Result<Operation, AppError>;

/// POST creates, PUT updates, DELETE deletes, GET reads when the path ends in
/// a key and lists otherwise. Anything else is `MethodNotAllowed`.
pub fn default_mux(method: &Method, uri: &Uri) -> Result<Operation, AppError> {
    match *method {
        Method::POST => Ok(Operation::Create),
        Method::PUT => Ok(Operation::Update),
        Method::DELETE => Ok(Operation::Delete),
        Method::GET if last_segment(uri.path()).is_empty() => Ok(Operation::List),
        Method::GET => Ok(Operation::Read),
        _ => Err(AppError::MethodNotAllowed),
    }
}
