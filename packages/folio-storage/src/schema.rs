//! The bundled Postgres DDL. `sql/init.sql` pulls in table files with psql `\ir` lines so it can
//! also be applied by hand; the embedded copy has those lines resolved at compile time.

const INIT: &str = include_str!("../../../sql/init.sql");
const INCLUDES: &[(&str, &str)] = &[(
	"tables/001_knowledge_fragments.sql",
	include_str!("../../../sql/tables/001_knowledge_fragments.sql"),
)];

pub fn render_schema() -> String {
	INIT.lines()
		.map(|line| match line.trim().strip_prefix("\\ir ") {
			Some(path) => INCLUDES
				.iter()
				.find(|(name, _)| *name == path.trim())
				.map_or(line, |(_, body)| body),
			None => line,
		})
		.collect::<Vec<_>>()
		.join("\n")
}
