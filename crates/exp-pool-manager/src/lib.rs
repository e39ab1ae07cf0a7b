mod in_memory;
mod similarity;

pub use in_memory::InMemoryExperienceManager;
pub use similarity::{cosine_similarity, lexical_similarity};

pub use exp_pool_core::ExperienceManager;
