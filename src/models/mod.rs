pub mod archetype;
pub mod card;
pub mod deck;
pub mod stats;
pub mod tournament;

pub use archetype::*;
pub use card::*;
pub use deck::*;
pub use stats::*;
pub use tournament::*;
