use time::OffsetDateTime;
use uuid::Uuid;

use folio_domain::{Category, KnowledgeFragment};

use crate::{
	Error, Result,
	db::Db,
	models::{self, FragmentRow},
};

const FRAGMENT_COLUMNS: &str = "\
fragment_id,
	content,
	embedding,
	category,
	priority,
	tags,
	source,
	is_active,
	query_count,
	version,
	created_at,
	updated_at";

pub async fn list_active(db: &Db, category: Option<Category>) -> Result<Vec<KnowledgeFragment>> {
	let sql = format!(
		"\
SELECT
	{FRAGMENT_COLUMNS}
FROM knowledge_fragments
WHERE is_active AND ($1::text IS NULL OR category = $1)
ORDER BY fragment_id"
	);
	let rows: Vec<FragmentRow> = sqlx::query_as(&sql)
		.bind(category.map(Category::as_str))
		.fetch_all(&db.pool)
		.await?;

	models::into_fragments(rows)
}

pub async fn find_active_by_ids(db: &Db, ids: &[Uuid]) -> Result<Vec<KnowledgeFragment>> {
	if ids.is_empty() {
		return Ok(Vec::new());
	}

	let sql = format!(
		"\
SELECT
	{FRAGMENT_COLUMNS}
FROM knowledge_fragments
WHERE is_active AND fragment_id = ANY($1)"
	);
	let rows: Vec<FragmentRow> = sqlx::query_as(&sql).bind(ids).fetch_all(&db.pool).await?;

	models::into_fragments(rows)
}

pub async fn find_by_id(db: &Db, id: Uuid) -> Result<Option<KnowledgeFragment>> {
	let sql = format!(
		"\
SELECT
	{FRAGMENT_COLUMNS}
FROM knowledge_fragments
WHERE fragment_id = $1"
	);
	let row: Option<FragmentRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&db.pool).await?;

	row.map(KnowledgeFragment::try_from).transpose()
}

pub async fn list_all(db: &Db) -> Result<Vec<KnowledgeFragment>> {
	let sql = format!(
		"\
SELECT
	{FRAGMENT_COLUMNS}
FROM knowledge_fragments
ORDER BY created_at, fragment_id"
	);
	let rows: Vec<FragmentRow> = sqlx::query_as(&sql).fetch_all(&db.pool).await?;

	models::into_fragments(rows)
}

/// Active fragments whose embedding is missing or has a dimension other than `dimensions`.
pub async fn list_missing_embeddings(db: &Db, dimensions: u32) -> Result<Vec<KnowledgeFragment>> {
	let sql = format!(
		"\
SELECT
	{FRAGMENT_COLUMNS}
FROM knowledge_fragments
WHERE is_active
	AND (embedding IS NULL OR coalesce(cardinality(embedding), 0) <> $1)
ORDER BY fragment_id"
	);
	let rows: Vec<FragmentRow> =
		sqlx::query_as(&sql).bind(dimensions as i32).fetch_all(&db.pool).await?;

	models::into_fragments(rows)
}

pub async fn insert_fragment(db: &Db, fragment: &KnowledgeFragment) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO knowledge_fragments (
	fragment_id,
	content,
	embedding,
	category,
	priority,
	tags,
	source,
	is_active,
	query_count,
	version,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
	)
	.bind(fragment.id)
	.bind(fragment.content.as_str())
	.bind(fragment.embedding.as_deref())
	.bind(fragment.category.as_str())
	.bind(fragment.priority.as_str())
	.bind(&fragment.tags)
	.bind(fragment.source.as_str())
	.bind(fragment.is_active)
	.bind(fragment.query_count)
	.bind(fragment.version)
	.bind(fragment.created_at)
	.bind(fragment.updated_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Writes every mutable column of `fragment`. The counter is left alone so concurrent hit
/// increments are not overwritten.
pub async fn update_fragment(db: &Db, fragment: &KnowledgeFragment) -> Result<()> {
	let result = sqlx::query(
		"\
UPDATE knowledge_fragments
SET
	content = $1,
	embedding = $2,
	category = $3,
	priority = $4,
	tags = $5,
	source = $6,
	is_active = $7,
	version = $8,
	updated_at = $9
WHERE fragment_id = $10",
	)
	.bind(fragment.content.as_str())
	.bind(fragment.embedding.as_deref())
	.bind(fragment.category.as_str())
	.bind(fragment.priority.as_str())
	.bind(&fragment.tags)
	.bind(fragment.source.as_str())
	.bind(fragment.is_active)
	.bind(fragment.version)
	.bind(fragment.updated_at)
	.bind(fragment.id)
	.execute(&db.pool)
	.await?;

	if result.rows_affected() == 0 {
		return Err(Error::MissingFragment(fragment.id));
	}

	Ok(())
}

pub async fn set_embedding(db: &Db, id: Uuid, embedding: Option<&[f32]>) -> Result<()> {
	sqlx::query("UPDATE knowledge_fragments SET embedding = $1 WHERE fragment_id = $2")
		.bind(embedding)
		.bind(id)
		.execute(&db.pool)
		.await?;

	Ok(())
}

/// Soft delete. Returns `false` when no active fragment had that id.
pub async fn deactivate(db: &Db, id: Uuid, now: OffsetDateTime) -> Result<bool> {
	let result = sqlx::query(
		"\
UPDATE knowledge_fragments
SET is_active = false, updated_at = $1
WHERE fragment_id = $2 AND is_active",
	)
	.bind(now)
	.bind(id)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn increment_query_count(db: &Db, ids: &[Uuid]) -> Result<u64> {
	if ids.is_empty() {
		return Ok(0);
	}

	let result = sqlx::query(
		"UPDATE knowledge_fragments SET query_count = query_count + 1 WHERE fragment_id = ANY($1)",
	)
	.bind(ids)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected())
}
