//! Static plant template tree.
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::model::{BranchingAlg, StemModel};

/// Surface description attached to a branch node. Opaque to the query engine.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialDef {
    /// Base color, linear RGB.
    pub color: [f32; 3],
    pub texture: Option<String>,
    pub double_sided: bool,
    pub transparent: bool,
    pub billboard: bool,
    pub alpha_test: bool,
}

impl Default for MaterialDef {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            texture: None,
            double_sided: false,
            transparent: false,
            billboard: false,
            alpha_test: false,
        }
    }
}

impl MaterialDef {
    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn with_texture(mut self, texture: impl Into<String>) -> Self {
        self.texture = Some(texture.into());
        self
    }

    pub fn with_double_sided(mut self, double_sided: bool) -> Self {
        self.double_sided = double_sided;
        self
    }

    pub fn with_billboard(mut self, billboard: bool) -> Self {
        self.billboard = billboard;
        self
    }
}

/// Level-of-detail range in which a branch group is visible.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisRange {
    pub enabled: bool,
    pub min: f32,
    pub max: f32,
}

impl Default for VisRange {
    fn default() -> Self {
        Self {
            enabled: false,
            min: 0.0,
            max: 1.0,
        }
    }
}

impl VisRange {
    /// Enabled range `[min, max]`.
    pub fn new(min: f32, max: f32) -> Self {
        Self {
            enabled: true,
            min,
            max,
        }
    }
}

/// One node of the template tree.
///
/// A node without a stem model never produces geometry, but its children are still
/// expanded. Child order is significant: it fixes both group numbering and buffer fill
/// order.
#[non_exhaustive]
pub struct BranchModel {
    pub name: String,
    pub stem: Option<Arc<dyn StemModel>>,
    pub branching: Option<Arc<dyn BranchingAlg>>,
    pub children: Vec<BranchModel>,
    /// Structural node without its own geometry; optionally excluded from group numbering.
    pub dummy: bool,
    pub material: MaterialDef,
    pub vis_range: VisRange,
}

impl BranchModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stem: None,
            branching: None,
            children: Vec::new(),
            dummy: false,
            material: MaterialDef::default(),
            vis_range: VisRange::default(),
        }
    }

    /// Structural node: no stem, flagged dummy.
    pub fn dummy(name: impl Into<String>) -> Self {
        Self::new(name).with_dummy(true)
    }

    pub fn with_stem<S: StemModel + 'static>(mut self, stem: S) -> Self {
        self.stem = Some(Arc::new(stem));
        self
    }

    pub fn with_stem_arc(mut self, stem: Arc<dyn StemModel>) -> Self {
        self.stem = Some(stem);
        self
    }

    pub fn with_branching<B: BranchingAlg + 'static>(mut self, branching: B) -> Self {
        self.branching = Some(Arc::new(branching));
        self
    }

    pub fn with_child(mut self, child: BranchModel) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: Vec<BranchModel>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_dummy(mut self, dummy: bool) -> Self {
        self.dummy = dummy;
        self
    }

    pub fn with_material(mut self, material: MaterialDef) -> Self {
        self.material = material;
        self
    }

    pub fn with_vis_range(mut self, vis_range: VisRange) -> Self {
        self.vis_range = vis_range;
        self
    }

    pub fn add_child(&mut self, child: BranchModel) -> &mut Self {
        self.children.push(child);
        self
    }

    pub fn stem_model(&self) -> Option<&dyn StemModel> {
        self.stem.as_deref()
    }

    pub fn branching_alg(&self) -> Option<&dyn BranchingAlg> {
        self.branching.as_deref()
    }

    pub fn is_dummy(&self) -> bool {
        self.dummy
    }

    /// Depth of the subtree rooted here (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(BranchModel::depth).max().unwrap_or(0)
    }
}

impl fmt::Debug for BranchModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BranchModel")
            .field("name", &self.name)
            .field("has_stem", &self.stem.is_some())
            .field("has_branching", &self.branching.is_some())
            .field("dummy", &self.dummy)
            .field("children", &self.children)
            .finish()
    }
}

/// Global switches of a plant model.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModelFlags {
    /// Generate without any random stream; every seed yields the same plant.
    pub no_randomness: bool,
}

impl ModelFlags {
    pub fn with_no_randomness(mut self, no_randomness: bool) -> Self {
        self.no_randomness = no_randomness;
        self
    }
}

/// Free-form authoring information carried by a model.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelMetaInfo {
    pub author: Option<String>,
    pub license: Option<String>,
    pub plant_info: Option<String>,
}

/// A complete plant template: the synthetic root ("plant base"), a base seed and flags.
#[non_exhaustive]
#[derive(Debug)]
pub struct PlantModel {
    pub base: BranchModel,
    pub base_seed: u32,
    pub flags: ModelFlags,
    pub meta_info: ModelMetaInfo,
}

impl PlantModel {
    pub fn new(base: BranchModel, base_seed: u32) -> Self {
        Self {
            base,
            base_seed,
            flags: ModelFlags::default(),
            meta_info: ModelMetaInfo::default(),
        }
    }

    pub fn with_flags(mut self, flags: ModelFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_meta_info(mut self, meta_info: ModelMetaInfo) -> Self {
        self.meta_info = meta_info;
        self
    }

    pub fn plant_base(&self) -> &BranchModel {
        &self.base
    }

    pub fn is_randomness_enabled(&self) -> bool {
        !self.flags.no_randomness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_child_order() {
        let base = BranchModel::new("base")
            .with_child(BranchModel::new("a"))
            .with_children(vec![BranchModel::new("b"), BranchModel::dummy("c")]);
        let names: Vec<_> = base.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert!(base.children[2].is_dummy());
        assert!(base.children[2].stem_model().is_none());
    }

    #[test]
    fn depth_counts_longest_path() {
        let mut base = BranchModel::new("base");
        base.add_child(BranchModel::new("a").with_child(BranchModel::new("a1")));
        base.add_child(BranchModel::new("b"));
        assert_eq!(base.depth(), 3);
    }

    #[test]
    fn flags_control_randomness() {
        let model = PlantModel::new(BranchModel::new("base"), 7);
        assert!(model.is_randomness_enabled());
        let model = model.with_flags(ModelFlags::default().with_no_randomness(true));
        assert!(!model.is_randomness_enabled());
    }
}
