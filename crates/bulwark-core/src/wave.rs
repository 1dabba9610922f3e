//! Wave content: definitions and the spawn entries they are built from.

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{DEFAULT_POST_COMBAT_DELAY_SECS, DEFAULT_PREPARATION_SECS, DEFAULT_SHOP_SECS};
use crate::types::ArchetypeId;

/// A batch of enemies of one archetype within a wave.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnEntry {
    /// Archetype to spawn. `None` marks a broken entry that gets pruned.
    pub archetype: Option<ArchetypeId>,
    /// Number of units in the entry.
    #[serde(default)]
    pub count: u32,
    /// Seconds waited after the burst (edge) or after each unit (lane).
    #[serde(default)]
    pub interval_secs: f32,
    /// Named lane. `None` (or a negative value in authored data) uses edge
    /// distribution.
    #[serde(default, deserialize_with = "lane_from_signed")]
    pub lane: Option<u32>,
    /// Burst along the far edge using the active spatial pattern.
    #[serde(default = "default_along_edge")]
    pub along_edge: bool,
}

fn default_along_edge() -> bool {
    true
}

fn lane_from_signed<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.and_then(|lane| u32::try_from(lane).ok()))
}

impl SpawnEntry {
    /// Burst entry distributed along the far edge.
    pub fn along_edge(archetype: ArchetypeId, count: u32, interval_secs: f32) -> Self {
        Self {
            archetype: Some(archetype),
            count,
            interval_secs,
            lane: None,
            along_edge: true,
        }
    }

    /// Lane entry paced per unit.
    pub fn in_lane(
        archetype: ArchetypeId,
        count: u32,
        interval_secs: f32,
        lane: Option<u32>,
    ) -> Self {
        Self {
            archetype: Some(archetype),
            count,
            interval_secs,
            lane,
            along_edge: false,
        }
    }

    /// Entries without an archetype or with a nonsensical interval are broken.
    pub fn is_valid(&self) -> bool {
        self.archetype.is_some() && self.interval_secs.is_finite() && self.interval_secs >= 0.0
    }
}

/// One wave: its spawn entries plus phase timing around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveDefinition {
    pub entries: Vec<SpawnEntry>,
    pub shop_secs: f32,
    pub preparation_secs: f32,
    pub post_combat_delay_secs: f32,
    /// Shop waits for an explicit advance instead of timing out.
    pub manual_shop: bool,
    /// Preparation waits for an explicit advance instead of timing out.
    pub manual_preparation: bool,
}

impl Default for WaveDefinition {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            shop_secs: DEFAULT_SHOP_SECS,
            preparation_secs: DEFAULT_PREPARATION_SECS,
            post_combat_delay_secs: DEFAULT_POST_COMBAT_DELAY_SECS,
            manual_shop: false,
            manual_preparation: false,
        }
    }
}

impl WaveDefinition {
    /// Default timing around the given entries.
    pub fn with_entries(entries: Vec<SpawnEntry>) -> Self {
        Self {
            entries,
            ..Default::default()
        }
    }

    /// Total units across all entries.
    pub fn total_enemies(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |acc, entry| acc.saturating_add(entry.count))
    }

    /// First archetype referenced by any entry.
    pub fn first_archetype(&self) -> Option<ArchetypeId> {
        self.entries.iter().find_map(|entry| entry.archetype)
    }

    /// A wave that would spawn nothing.
    pub fn is_empty(&self) -> bool {
        self.total_enemies() == 0
    }
}
