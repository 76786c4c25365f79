use async_trait::async_trait;

use super::EmbeddingProvider;
use crate::error::EmbedError;
use crate::graph::Vector;

/// Keyword families that pull a fallback vector toward a shared region.
const CATEGORIES: &[&[&str]] = &[
	&["combat", "fight", "sword", "weapon", "battle", "attack", "shield", "enemy", "armor"],
	&["gold", "coin", "shop", "trade", "price", "money", "economy", "resource", "currency"],
	&["story", "character", "quest", "dialogue", "lore", "plot", "narrative", "hero"],
	&["level", "upgrade", "skill", "experience", "unlock", "idle", "prestige", "progress"],
	&["map", "world", "biome", "dungeon", "terrain", "city", "island", "forest"],
	&["guild", "friend", "chat", "multiplayer", "team", "clan", "social", "party"],
	&["art", "music", "sound", "color", "style", "animation", "visual", "theme"],
	&["code", "server", "engine", "database", "network", "api", "bug", "performance"],
];

const NOISE: f32 = 0.3;

/// Linear congruential step in `[0, 1)`.
fn rand_simple(seed: usize) -> f32 {
	let x = ((seed % 233_280 + 1) * 9301 + 49297) % 233_280;
	x as f32 / 233_280.0
}

/// Deterministic low-fidelity embedding used when the real provider fails.
///
/// Produces seeded noise from the text itself, then adds a strong bias on the
/// dimensions owned by every keyword family the text mentions. Texts sharing a family
/// land close together; unrelated texts stay near-orthogonal.
#[derive(Clone, Debug)]
pub struct KeywordFallbackEmbedder {
	dimension: usize,
}

impl KeywordFallbackEmbedder {
	/// A zero `dimension` is bumped to one.
	pub fn new(dimension: usize) -> Self {
		Self {
			dimension: dimension.max(1),
		}
	}

	pub fn dimension(&self) -> usize {
		self.dimension
	}

	/// Returns the unit-length fallback vector for `text`.
	pub fn vector(&self, text: &str) -> Vector {
		let lower = text.to_lowercase();
		let seed = lower
			.bytes()
			.fold(17usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));

		let mut vector: Vector = (0..self.dimension)
			.map(|i| (rand_simple(seed.wrapping_add(i)) * 2.0 - 1.0) * NOISE)
			.collect();

		let tokens: Vec<&str> = lower
			.split(|c: char| !c.is_alphanumeric())
			.filter(|t| !t.is_empty())
			.collect();
		for (family, keywords) in CATEGORIES.iter().enumerate() {
			let hit = tokens
				.iter()
				.any(|t| keywords.iter().any(|k| t.starts_with(k)));
			if !hit {
				continue;
			}
			for (i, v) in vector.iter_mut().enumerate() {
				if i % CATEGORIES.len() == family {
					*v += 1.0;
				}
			}
		}

		let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
		if norm > 0.0 {
			vector.iter_mut().for_each(|v| *v /= norm);
		}
		vector
	}
}

#[async_trait(?Send)]
impl EmbeddingProvider for KeywordFallbackEmbedder {
	async fn embed(&self, text: &str) -> Result<Vector, EmbedError> {
		Ok(self.vector(text))
	}

	fn dimension(&self) -> usize {
		self.dimension
	}

	fn name(&self) -> &str {
		"keyword-fallback"
	}
}
