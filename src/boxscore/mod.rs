pub mod accumulator;
pub mod game;
pub mod positions;
pub mod record;
pub mod side;
pub mod stat;

pub use accumulator::Accumulator;
pub use game::Game;
pub use side::Side;
pub use stat::Stat;
