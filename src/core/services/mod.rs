pub mod summary_service;

pub use summary_service::{
    CategoryTotal, MonthComparison, MonthSummary, ResolvedLine, SummaryService,
};

use crate::errors::EngineError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("{0}")]
    Invalid(String),
}
