//! Similarity and centroid math over embedding vectors.
//!
//! Neither function fails: degenerate input (zero vectors, mismatched dimensions) yields a
//! neutral result so a bad vector can never block placement.

use log::warn;

use super::types::Vector;

/// Cosine similarity of `a` and `b`, in `[-1, 1]`.
///
/// Returns `0.0` if either vector has zero magnitude, and `0.0` with a warning if the
/// dimensions differ. Accumulates in `f64` so that `cosine_similarity(v, v)` is exactly
/// `1.0` for any non-zero `v` and the result is symmetric in its arguments.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	if a.len() != b.len() {
		warn!(
			"cosine similarity on mismatched dimensions ({} vs {}), treating as unrelated",
			a.len(),
			b.len()
		);
		return 0.0;
	}

	let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
	for (&x, &y) in a.iter().zip(b) {
		let (x, y) = (x as f64, y as f64);
		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}
	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	(dot / (norm_a * norm_b).sqrt()).clamp(-1.0, 1.0) as f32
}

/// Component-wise mean of `vectors`.
///
/// The first vector fixes the dimension; vectors of any other dimension are skipped, as
/// are vectors with a non-finite component. Returns an empty vector when there is nothing
/// to average.
pub fn centroid<'a, I>(vectors: I) -> Vector
where
	I: IntoIterator<Item = &'a [f32]>,
{
	let mut vectors = vectors
		.into_iter()
		.filter(|v| v.iter().all(|x| x.is_finite()));
	let Some(first) = vectors.next() else {
		return Vector::new();
	};

	let mut sum: Vec<f64> = first.iter().map(|&x| x as f64).collect();
	let mut count = 1usize;
	for v in vectors {
		if v.len() != sum.len() {
			warn!(
				"skipping vector of dimension {} in centroid of dimension {}",
				v.len(),
				sum.len()
			);
			continue;
		}
		for (acc, &x) in sum.iter_mut().zip(v) {
			*acc += x as f64;
		}
		count += 1;
	}

	sum.into_iter().map(|s| (s / count as f64) as f32).collect()
}
