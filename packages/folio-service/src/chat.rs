use serde::{Deserialize, Serialize};
use uuid::Uuid;

use folio_domain::{Category, RetrievalMethod, RetrievalResult};
use folio_providers::llm::{ChatMessage, Role};

use crate::{Error, FolioService, Result, RetrieveOptions};

const PERSONA_PLACEHOLDER: &str = "{persona}";

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
	pub message: String,
	#[serde(default)]
	pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
	Generated,
	Templated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSource {
	pub id: Uuid,
	pub category: Category,
	pub score: f32,
	pub method: RetrievalMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
	pub answer: String,
	pub mode: AnswerMode,
	pub sources: Vec<ChatSource>,
}

impl FolioService {
	/// Answers one chat message from retrieved knowledge.
	///
	/// Only an empty message is an error. A failed or empty retrieval, a failed model call, or
	/// a blank model answer all produce the templated answer for the top category instead.
	pub async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
		let message = req.message.trim();

		if message.is_empty() {
			return Err(Error::InvalidRequest { message: "message must be non-empty.".to_string() });
		}

		let options = RetrieveOptions::from_config(&self.cfg.retrieval);
		let mut results = match self.retrieve(message, options).await {
			Ok(results) => results,
			Err(err) => {
				tracing::warn!(error = %err, "Retrieval failed; answering from template.");

				return Ok(self.templated(None, Vec::new()));
			},
		};

		if results.is_empty() {
			return Ok(self.templated(None, Vec::new()));
		}

		results.truncate(self.cfg.chat.max_context_fragments as usize);

		let top_category = results.first().map(RetrievalResult::category);
		let sources = results.iter().map(source_of).collect::<Vec<_>>();
		let messages = self.build_messages(&results, &req.history, message);

		match self.providers.chat.complete(&self.cfg.providers.llm, &messages).await {
			Ok(answer) if !answer.trim().is_empty() => Ok(ChatResponse {
				answer: answer.trim().to_string(),
				mode: AnswerMode::Generated,
				sources,
			}),
			Ok(_) => {
				tracing::warn!(
					"Language model returned a blank answer; answering from template."
				);

				Ok(self.templated(top_category, sources))
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					"Language model call failed; answering from template."
				);

				Ok(self.templated(top_category, sources))
			},
		}
	}

	/// System prompt with numbered context, the most recent history turns, then the message.
	pub fn build_messages(
		&self,
		context: &[RetrievalResult],
		history: &[ChatMessage],
		message: &str,
	) -> Vec<ChatMessage> {
		let persona = self.cfg.chat.persona_name.as_str();
		let mut system = format!(
			"You are the assistant on {persona}'s portfolio website. Answer questions about \
			 {persona} using only the context below. If the context does not contain the answer, \
			 say you do not know and suggest using the contact page.\n\nContext:\n"
		);

		for (i, result) in context.iter().enumerate() {
			system.push_str(&format!("[{}] ({}) {}\n", i + 1, result.category(), result.content()));
		}

		let turns = history
			.iter()
			.filter(|turn| turn.role != Role::System && !turn.content.trim().is_empty())
			.collect::<Vec<_>>();
		let keep = self.cfg.chat.max_history_turns as usize;
		let mut messages = Vec::with_capacity(keep + 2);
		let recent = &turns[turns.len().saturating_sub(keep)..];

		messages.push(ChatMessage::new(Role::System, system));
		messages.extend(recent.iter().map(|turn| (*turn).clone()));
		messages.push(ChatMessage::new(Role::User, message));

		messages
	}

	/// The canned answer for `category`, or the generic one when there is no category.
	pub fn template_for(&self, category: Option<Category>) -> String {
		let key = category.unwrap_or(Category::Other);
		let template = self
			.cfg
			.chat
			.templates
			.get(key.as_str())
			.map(String::as_str)
			.unwrap_or_else(|| default_template(key));

		template.replace(PERSONA_PLACEHOLDER, &self.cfg.chat.persona_name)
	}

	fn templated(&self, category: Option<Category>, sources: Vec<ChatSource>) -> ChatResponse {
		ChatResponse { answer: self.template_for(category), mode: AnswerMode::Templated, sources }
	}
}

fn source_of(result: &RetrievalResult) -> ChatSource {
	ChatSource {
		id: result.fragment.id,
		category: result.category(),
		score: result.score,
		method: result.method,
	}
}

fn default_template(category: Category) -> &'static str {
	match category {
		Category::Personal =>
			"I can't generate a detailed answer right now, but there is more about {persona} on the about page.",
		Category::Skills =>
			"I can't generate a detailed answer right now. {persona}'s skills and tech stack are listed on the skills page.",
		Category::Experience =>
			"I can't generate a detailed answer right now. {persona}'s work history is on the experience page.",
		Category::Projects =>
			"I can't generate a detailed answer right now. Take a look at the projects page for {persona}'s work.",
		Category::Education =>
			"I can't generate a detailed answer right now. {persona}'s education is covered on the about page.",
		Category::Achievements =>
			"I can't generate a detailed answer right now. {persona}'s awards and highlights are on the about page.",
		Category::Contact =>
			"The best way to reach {persona} is through the contact page.",
		Category::Other =>
			"I don't have a good answer to that yet. Feel free to reach out to {persona} through the contact page.",
	}
}
