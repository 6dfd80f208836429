pub mod surface;
pub mod terminal;
