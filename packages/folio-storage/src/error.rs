use uuid::Uuid;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error(transparent)]
	Qdrant(#[from] Box<qdrant_client::QdrantError>),
	#[error("Fragment {0} does not exist.")]
	MissingFragment(Uuid),
	#[error("Fragment {fragment_id} has an unreadable {column} value: {message}")]
	CorruptRow { fragment_id: Uuid, column: &'static str, message: String },
	#[error("Vector for fragment {fragment_id} has {actual} dimensions; the index expects {expected}.")]
	DimensionMismatch { fragment_id: Uuid, expected: u32, actual: usize },
}
impl From<qdrant_client::QdrantError> for Error {
	fn from(err: qdrant_client::QdrantError) -> Self {
		Self::Qdrant(Box::new(err))
	}
}
