//! Branching contracts.
use glam::{Quat, Vec3};
use rand::Rng as RngCore;

use crate::model::StemInstance;

/// Receives the branches a [`BranchingAlg`] decides to produce.
pub trait BranchingFactory {
    /// Realises one branch at `offset`/`orientation` in the parent's frame.
    ///
    /// `rng` must be the stream the algorithm was handed (reborrowed); the factory consumes
    /// it for the new branch and its whole subtree before returning.
    fn generate_branch(&mut self, rng: Option<&mut dyn RngCore>, offset: Vec3, orientation: Quat);
}

/// Decides how many branches a node produces under a parent and where they go.
///
/// Implementations must call [`BranchingFactory::generate_branch`] synchronously, in an
/// order determined only by their own parameters and the random stream, and must be
/// deterministic when `rng` is `None`.
pub trait BranchingAlg: Send + Sync {
    fn create_branches(
        &self,
        factory: &mut dyn BranchingFactory,
        parent: Option<&dyn StemInstance>,
        rng: Option<&mut dyn RngCore>,
    );
}

/// Any `Fn(factory, parent, rng)` closure is a branching algorithm.
impl<F> BranchingAlg for F
where
    F: Fn(&mut dyn BranchingFactory, Option<&dyn StemInstance>, Option<&mut dyn RngCore>)
        + Send
        + Sync,
{
    fn create_branches(
        &self,
        factory: &mut dyn BranchingFactory,
        parent: Option<&dyn StemInstance>,
        rng: Option<&mut dyn RngCore>,
    ) {
        self(factory, parent, rng)
    }
}
