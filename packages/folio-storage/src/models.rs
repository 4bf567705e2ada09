use time::OffsetDateTime;
use uuid::Uuid;

use folio_domain::{KnowledgeFragment, UnknownVariant};

use crate::Error;

#[derive(Debug, sqlx::FromRow)]
pub struct FragmentRow {
	pub fragment_id: Uuid,
	pub content: String,
	pub embedding: Option<Vec<f32>>,
	pub category: String,
	pub priority: String,
	pub tags: Vec<String>,
	pub source: String,
	pub is_active: bool,
	pub query_count: i64,
	pub version: i32,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl TryFrom<FragmentRow> for KnowledgeFragment {
	type Error = Error;

	fn try_from(row: FragmentRow) -> Result<Self, Self::Error> {
		let category = row
			.category
			.parse()
			.map_err(|err: UnknownVariant| corrupt(row.fragment_id, "category", err))?;
		let priority = row
			.priority
			.parse()
			.map_err(|err: UnknownVariant| corrupt(row.fragment_id, "priority", err))?;

		Ok(Self {
			id: row.fragment_id,
			content: row.content,
			embedding: row.embedding,
			category,
			priority,
			tags: row.tags,
			source: row.source,
			is_active: row.is_active,
			query_count: row.query_count,
			version: row.version,
			created_at: row.created_at,
			updated_at: row.updated_at,
		})
	}
}

fn corrupt(fragment_id: Uuid, column: &'static str, err: UnknownVariant) -> Error {
	Error::CorruptRow { fragment_id, column, message: err.to_string() }
}

pub(crate) fn into_fragments(rows: Vec<FragmentRow>) -> Result<Vec<KnowledgeFragment>, Error> {
	rows.into_iter().map(KnowledgeFragment::try_from).collect()
}
