use super::AppError;

/// A listing result that keeps "nothing matched" apart from "query failed".
#[derive(Debug)]
pub enum Outcome<T> {
    Data(Vec<T>),
    Empty,
    Failed(AppError),
}

impl<T> From<Result<Vec<T>, AppError>> for Outcome<T> {
    fn from(result: Result<Vec<T>, AppError>) -> Self {
        match result {
            Ok(items) if items.is_empty() => Outcome::Empty,
            Ok(items) => Outcome::Data(items),
            Err(err) => Outcome::Failed(err),
        }
    }
}

impl<T> Outcome<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// Back to a plain result; `Empty` becomes an empty vector.
    pub fn into_result(self) -> Result<Vec<T>, AppError> {
        match self {
            Outcome::Data(items) => Ok(items),
            Outcome::Empty => Ok(Vec::new()),
            Outcome::Failed(err) => Err(err),
        }
    }
}

/// Opt-in "log and use the default" handling for callers that prefer a
/// degraded answer over an error.
pub trait Lenient<T> {
    fn or_logged_default(self, operation: &str) -> T;
}

impl<T: Default> Lenient<T> for Result<T, AppError> {
    fn or_logged_default(self, operation: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(operation, error = %err, "operation failed, using default");
                T::default()
            }
        }
    }
}
