//! Physics blocks, field selectors, assembly modes and block vectors.

use std::fmt;
use std::ops::{Index, IndexMut};

use nalgebra::DVector;

/// Sub-physics block of the monolithic system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockId {
    /// Fluid velocity block.
    Fluid,
    /// Structure displacement/velocity block.
    Structure,
}

impl BlockId {
    /// All blocks in storage order.
    pub const ALL: [BlockId; 2] = [BlockId::Fluid, BlockId::Structure];

    /// Storage index of the block.
    pub fn index(self) -> usize {
        match self {
            BlockId::Fluid => 0,
            BlockId::Structure => 1,
        }
    }

    /// Human-readable block name.
    pub fn name(self) -> &'static str {
        match self {
            BlockId::Fluid => "fluid",
            BlockId::Structure => "structure",
        }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Physical quantity selected when moving interface data between blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    /// Structure displacement slots.
    Displacement,
    /// Structure velocity slots.
    Velocity,
    /// Every interface slot of the block.
    #[default]
    All,
}

/// Coupling mode an assembler builds its system for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Full (nonhomogeneous) state problem.
    State,
    /// Adjoint of the linearized problem.
    Adjoint,
    /// Linearized problem driven only by interface data.
    Linear,
}

/// Coupling variable matched across the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdjointType {
    /// Structure displacement rate `d / Δt` against fluid velocity.
    Displacement,
    /// Structure velocity against fluid velocity.
    #[default]
    Velocity,
}

impl AdjointType {
    /// Decode the integer flag used in parameter files (1 = displacement).
    pub fn from_flag(flag: u32) -> Self {
        if flag == 1 {
            AdjointType::Displacement
        } else {
            AdjointType::Velocity
        }
    }

    /// Structure field whose trace is matched against the fluid velocity.
    pub fn structure_field(self) -> Field {
        match self {
            AdjointType::Displacement => Field::Displacement,
            AdjointType::Velocity => Field::Velocity,
        }
    }
}

/// One vector per physics block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockVector {
    blocks: [DVector<f64>; 2],
}

impl BlockVector {
    /// Create a zero vector with the given fluid and structure sizes.
    pub fn zeros(fluid: usize, structure: usize) -> Self {
        Self {
            blocks: [DVector::zeros(fluid), DVector::zeros(structure)],
        }
    }

    /// Create a zero vector with the same block sizes as `other`.
    pub fn zeros_like(other: &BlockVector) -> Self {
        Self::zeros(other.blocks[0].len(), other.blocks[1].len())
    }

    /// Build from explicit block vectors.
    pub fn from_blocks(fluid: DVector<f64>, structure: DVector<f64>) -> Self {
        Self {
            blocks: [fluid, structure],
        }
    }

    /// Borrow one block.
    pub fn block(&self, id: BlockId) -> &DVector<f64> {
        &self.blocks[id.index()]
    }

    /// Mutably borrow one block.
    pub fn block_mut(&mut self, id: BlockId) -> &mut DVector<f64> {
        &mut self.blocks[id.index()]
    }

    /// Replace one block.
    pub fn set_block(&mut self, id: BlockId, values: DVector<f64>) {
        self.blocks[id.index()] = values;
    }

    /// Block sizes `(fluid, structure)`.
    pub fn sizes(&self) -> (usize, usize) {
        (self.blocks[0].len(), self.blocks[1].len())
    }

    /// Set every entry to zero.
    pub fn fill_zero(&mut self) {
        for block in &mut self.blocks {
            block.fill(0.0);
        }
    }
}

impl Index<BlockId> for BlockVector {
    type Output = DVector<f64>;

    fn index(&self, id: BlockId) -> &Self::Output {
        self.block(id)
    }
}

impl IndexMut<BlockId> for BlockVector {
    fn index_mut(&mut self, id: BlockId) -> &mut Self::Output {
        self.block_mut(id)
    }
}
