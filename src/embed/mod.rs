//! Embedding providers.
//!
//! Placement never fails because an embedding could not be computed:
//! [`ResilientEmbedder`] substitutes the deterministic [`KeywordFallbackEmbedder`] and
//! tags the result so callers can tell the two apart.

mod fallback;

use async_trait::async_trait;
use log::warn;

pub use fallback::KeywordFallbackEmbedder;

use crate::error::EmbedError;
use crate::graph::Vector;

/// Converts text to a fixed-dimension vector.
///
/// Not `Send`: in the browser the provider awaits JS promises.
#[async_trait(?Send)]
pub trait EmbeddingProvider {
	/// Embeds a single text.
	async fn embed(&self, text: &str) -> Result<Vector, EmbedError>;

	/// Dimension of every vector this provider returns.
	fn dimension(&self) -> usize;

	fn name(&self) -> &str {
		"embedding-provider"
	}
}

/// Where an embedding came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingSource {
	Provider,
	Fallback,
}

/// A vector tagged with its origin.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding {
	pub vector: Vector,
	pub source: EmbeddingSource,
}

impl Embedding {
	pub fn is_fallback(&self) -> bool {
		self.source == EmbeddingSource::Fallback
	}
}

/// Wraps a primary provider and falls back to keyword embeddings on any failure.
pub struct ResilientEmbedder<P> {
	primary: Option<P>,
	fallback: KeywordFallbackEmbedder,
}

impl<P: EmbeddingProvider> ResilientEmbedder<P> {
	/// Fallback vectors match the primary provider's dimension.
	pub fn new(primary: P) -> Self {
		let fallback = KeywordFallbackEmbedder::new(primary.dimension());
		Self {
			primary: Some(primary),
			fallback,
		}
	}

	/// Embeds with the fallback only.
	pub fn offline(dimension: usize) -> Self {
		Self {
			primary: None,
			fallback: KeywordFallbackEmbedder::new(dimension),
		}
	}

	pub fn dimension(&self) -> usize {
		self.fallback.dimension()
	}

	/// Always yields a vector of [`Self::dimension`] finite components.
	pub async fn embed(&self, text: &str) -> Embedding {
		let Some(primary) = &self.primary else {
			return self.fallback_embedding(text);
		};

		let result = primary.embed(text).await.and_then(|vector| {
			if vector.len() != primary.dimension() {
				return Err(EmbedError::Dimension {
					expected: primary.dimension(),
					got: vector.len(),
				});
			}
			match vector.iter().position(|x| !x.is_finite()) {
				Some(i) => Err(EmbedError::NonFinite(i)),
				None => Ok(vector),
			}
		});

		match result {
			Ok(vector) => Embedding {
				vector,
				source: EmbeddingSource::Provider,
			},
			Err(err) => {
				warn!("{} failed ({err}), using keyword fallback", primary.name());
				self.fallback_embedding(text)
			}
		}
	}

	fn fallback_embedding(&self, text: &str) -> Embedding {
		Embedding {
			vector: self.fallback.vector(text),
			source: EmbeddingSource::Fallback,
		}
	}
}
