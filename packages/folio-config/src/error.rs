use std::{io, path::PathBuf};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Cannot read folio config {path:?}.")]
	ReadConfig { path: PathBuf, source: io::Error },
	#[error("Folio config {path:?} is not valid TOML for this schema.")]
	ParseConfig { path: PathBuf, source: toml::de::Error },
	#[error("chat.templates.{key} is not a known category; expected one of {expected}.")]
	UnknownTemplate { key: String, expected: String },
	#[error("{message}")]
	Validation { message: String },
}
