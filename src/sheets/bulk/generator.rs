// src/sheets/bulk/generator.rs
// Type-aware synthetic cell values for bulk inserts.

use crate::sheets::database::functions::fold_case;
use crate::sheets::definitions::ColumnDataType;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Dennis", "Edsger", "Frances", "Grace", "Hedy", "Ivan",
    "Joan", "Ken", "Linus", "Margaret", "Niklaus", "Radia", "Sophie", "Tim",
];

const LAST_NAMES: &[&str] = &[
    "Allen", "Backus", "Cerf", "Dijkstra", "Engelbart", "Hamilton", "Hopper", "Kay", "Knuth",
    "Lamport", "Liskov", "Lovelace", "Perlman", "Ritchie", "Shannon", "Thompson", "Turing", "Wirth",
];

const WORDS: &[&str] = &[
    "amber", "basalt", "cedar", "delta", "ember", "fjord", "granite", "harbor", "indigo", "juniper",
    "kestrel", "lagoon", "meadow", "nimbus", "orchid", "prairie", "quartz", "ridge", "summit",
    "tundra", "umber", "valley", "willow", "zephyr",
];

fn pick<'a>(rng: &mut StdRng, list: &'a [&str]) -> &'a str {
    list[rng.random_range(0..list.len())]
}

pub struct ValueGenerator {
    rng: StdRng,
}

impl ValueGenerator {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Generator for one batch: reproducible per batch when seeded.
    pub fn for_batch(seed: Option<u64>, batch_index: usize) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed.wrapping_add(batch_index as u64)),
            None => Self::from_entropy(),
        }
    }

    /// A value for a cell of `data_type`. Columns whose name mentions "name"
    /// get person names, other text columns get a couple of words.
    pub fn value_for(&mut self, data_type: ColumnDataType, column_name: &str) -> String {
        match data_type {
            ColumnDataType::Number => {
                if self.rng.random_bool(0.7) {
                    self.rng.random_range(0..1_000).to_string()
                } else {
                    format!("{:.2}", self.rng.random_range(0.0..1_000.0))
                }
            }
            ColumnDataType::Text if fold_case(column_name).contains("name") => {
                format!(
                    "{} {}",
                    pick(&mut self.rng, FIRST_NAMES),
                    pick(&mut self.rng, LAST_NAMES)
                )
            }
            ColumnDataType::Text => {
                format!("{} {}", pick(&mut self.rng, WORDS), pick(&mut self.rng, WORDS))
            }
        }
    }
}
