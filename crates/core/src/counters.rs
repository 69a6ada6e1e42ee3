//! Session counters.
//!
//! One value object per tick, passed by copy to the objective tracker and the
//! end-of-session rating so evaluation order never matters.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionCounters {
    pub mistakes: u32,
    pub moves_used: u32,
    pub streak: u32,
    pub max_streak: u32,
    pub hints_used: u32,
    pub elapsed_ms: u64,
    pub sorted: u32,
    pub rare_sorted: u32,
    pub specials_triggered: u32,
    pub grimy_total: u32,
    pub grimy_cleaned: u32,
    pub discards_total: u32,
    pub discards_binned: u32,
    pub score: u64,
    pub won: bool,
}

impl SessionCounters {
    pub fn elapsed_secs(&self) -> u32 {
        (self.elapsed_ms / 1000) as u32
    }

    pub fn all_grime_cleaned(&self) -> bool {
        self.grimy_cleaned >= self.grimy_total
    }

    pub fn all_discards_binned(&self) -> bool {
        self.discards_binned >= self.discards_total
    }
}
