pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Vector index unavailable: {message}")]
	IndexUnavailable { message: String },
	#[error("Timed out: {message}")]
	Timeout { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
}
impl From<folio_storage::Error> for Error {
	fn from(err: folio_storage::Error) -> Self {
		match err {
			folio_storage::Error::MissingFragment(id) =>
				Self::NotFound { message: format!("No fragment {id}.") },
			folio_storage::Error::DimensionMismatch { .. } =>
				Self::InvalidRequest { message: err.to_string() },
			folio_storage::Error::Qdrant(_) => Self::Qdrant { message: err.to_string() },
			folio_storage::Error::Sqlx(_) | folio_storage::Error::CorruptRow { .. } =>
				Self::Storage { message: err.to_string() },
		}
	}
}

impl From<folio_providers::Error> for Error {
	fn from(err: folio_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
