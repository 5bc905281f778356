use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::blocks::{Block, BlockId, BlockKind};

/// The user's program: blocks run in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    blocks: Vec<Block>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_kinds<I>(kinds: I) -> Self
    where
        I: IntoIterator<Item = BlockKind>,
    {
        let mut script = Self::new();
        for kind in kinds {
            script.append(kind);
        }
        script
    }

    /// Reads a JSON array of blocks. Numeric inputs are clamped like palette input.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("Failed to read script {}", path.display()))?;
        let kinds: Vec<BlockKind> = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse script {}", path.display()))?;
        Ok(Self::from_kinds(kinds.into_iter().map(BlockKind::clamped)))
    }

    pub fn kinds(&self) -> impl Iterator<Item = BlockKind> + '_ {
        self.blocks.iter().map(|block| block.kind)
    }

    pub fn append(&mut self, kind: BlockKind) -> BlockId {
        let block = Block::new(kind);
        let id = block.id;
        self.blocks.push(block);
        id
    }

    pub fn remove(&mut self, id: BlockId) -> bool {
        let before = self.blocks.len();
        self.blocks.retain(|block| block.id != id);
        self.blocks.len() != before
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|block| block.id == id)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_order_and_remove_by_id() {
        let mut script = Script::new();
        let first = script.append(BlockKind::move_steps(10.0));
        let second = script.append(BlockKind::turn(90.0));
        let third = script.append(BlockKind::NextCostume);
        assert!(script.remove(second));
        assert!(!script.remove(second), "second removal is a no-op");
        let ids: Vec<_> = script.iter().map(|block| block.id).collect();
        assert_eq!(ids, vec![first, third]);
        assert!(script.get(third).is_some());
    }

    #[test]
    fn load_clamps_inputs() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("script.json");
        fs::write(&path, r#"[{"type":"move","steps":500},{"type":"turn","degrees":-900},{"type":"next_costume"}]"#)
            .expect("write script");
        let script = Script::load(&path).expect("load script");
        let kinds: Vec<_> = script.kinds().collect();
        assert_eq!(
            kinds,
            vec![BlockKind::move_steps(240.0), BlockKind::turn(-360.0), BlockKind::NextCostume]
        );
    }

    #[test]
    fn clear_empties_script() {
        let mut script = Script::from_kinds([BlockKind::NextCostume, BlockKind::RandomBackground]);
        assert_eq!(script.len(), 2);
        script.clear();
        assert!(script.is_empty());
    }
}
