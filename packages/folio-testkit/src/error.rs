pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Test stack setup failed: {0}")]
	Setup(String),
	#[error("Test stack cleanup failed: {0}")]
	Cleanup(String),
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
}
