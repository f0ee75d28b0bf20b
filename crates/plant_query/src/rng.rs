//! Deterministic random stream shared by one traversal.
//!
//! Every instance query seeds a fresh stream from the instance's base seed and threads it,
//! in depth-first order, through stem creation and branching. A model flagged as
//! non-random passes `None` instead; all helpers here have a deterministic fallback for
//! that case.
use rand::rngs::StdRng;
use rand::{Rng as RngCore, SeedableRng};

/// Creates the stream for a plant instance seed.
pub fn seeded_stream(seed: u32) -> StdRng {
    StdRng::seed_from_u64(mix_u64(u64::from(seed)))
}

/// Reborrows an optional stream for one nested call, keeping `rng` usable afterwards.
#[inline]
pub fn reborrow<'a>(rng: &'a mut Option<&mut dyn RngCore>) -> Option<&'a mut dyn RngCore> {
    match rng {
        Some(r) => Some(&mut **r),
        None => None,
    }
}

/// Generate a random float in the range [0, 1).
#[inline]
pub fn rand01(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}

/// Like [`rand01`], returning `fallback` when randomness is disabled.
#[inline]
pub fn rand01_or(rng: Option<&mut dyn RngCore>, fallback: f32) -> f32 {
    match rng {
        Some(rng) => rand01(rng),
        None => fallback,
    }
}

/// Uniform value in `[min, max)`; the midpoint when randomness is disabled.
#[inline]
pub fn uniform(rng: Option<&mut dyn RngCore>, min: f32, max: f32) -> f32 {
    min + rand01_or(rng, 0.5) * (max - min)
}

/// Uniform integer in `min..=max`; `min` when randomness is disabled.
pub fn uniform_count(rng: Option<&mut dyn RngCore>, min: u32, max: u32) -> u32 {
    if max <= min {
        return min;
    }
    match rng {
        Some(rng) => {
            let span = u64::from(max - min) + 1;
            min + (u64::from(rng.next_u32()) % span) as u32
        }
        None => min,
    }
}

#[inline]
fn mix_u64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58476D1CE4E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}
