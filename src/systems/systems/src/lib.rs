pub mod shared;
pub mod simulation;
