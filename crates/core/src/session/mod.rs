//! Background session upkeep

pub mod refresher;

pub use refresher::SessionRefresher;
