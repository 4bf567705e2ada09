pub mod fragment;
pub mod intent;
pub mod text;
pub mod time_serde;
pub mod writegate;

pub use fragment::{
	Category, KnowledgeFragment, Priority, RetrievalMethod, RetrievalResult, UnknownVariant,
	clamp_unit, normalize_cosine,
};
pub use intent::classify;
