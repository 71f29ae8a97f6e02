//! Seeding policies: the order teams enter round 1.
//!
//! The bracket pairs seeds in order (1v2, 3v4, ...) and gives the last seed
//! the bye when the count is odd, so a policy expresses everything it wants
//! through the order it returns.

use crate::models::EligibleTeam;
use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Orders eligible teams for bracket construction.
pub trait Seeder {
    fn seed(&mut self, teams: Vec<EligibleTeam>) -> Vec<EligibleTeam>;
}

/// Shuffle. Seeds randomly.
pub struct RandomSeeding<R: Rng> {
    rng: R,
}

impl RandomSeeding<ThreadRng> {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for RandomSeeding<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomSeeding<R> {
    /// Use a caller-provided generator (e.g. a seeded one in tests).
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Seeder for RandomSeeding<R> {
    fn seed(&mut self, mut teams: Vec<EligibleTeam>) -> Vec<EligibleTeam> {
        teams.shuffle(&mut self.rng);
        teams
    }
}

/// Deterministic: by rank (unranked last), then name.
///
/// Pairs strongest against weakest (1vN, 2vN-1, ...). With an odd count the
/// lowest-ranked team is held back for the bye.
#[derive(Clone, Copy, Debug, Default)]
pub struct RankedSeeding;

impl Seeder for RankedSeeding {
    fn seed(&mut self, mut teams: Vec<EligibleTeam>) -> Vec<EligibleTeam> {
        teams.sort_by(|a, b| {
            let ka = (a.team.rank.is_none(), a.team.rank, a.team.name.to_lowercase());
            let kb = (b.team.rank.is_none(), b.team.rank, b.team.name.to_lowercase());
            ka.cmp(&kb)
        });
        let bye = if teams.len() % 2 == 1 { teams.pop() } else { None };

        let mut ordered = Vec::with_capacity(teams.len() + 1);
        let mut front = 0;
        let mut back = teams.len();
        while front < back {
            back -= 1;
            ordered.push(teams[front].clone());
            if front != back {
                ordered.push(teams[back].clone());
            }
            front += 1;
        }
        ordered.extend(bye);
        ordered
    }
}

/// Wire-level choice of seeding policy.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedingPolicy {
    #[default]
    Random,
    Ranked,
}

impl SeedingPolicy {
    pub fn seeder(self) -> Box<dyn Seeder> {
        match self {
            SeedingPolicy::Random => Box::new(RandomSeeding::new()),
            SeedingPolicy::Ranked => Box::new(RankedSeeding),
        }
    }
}
