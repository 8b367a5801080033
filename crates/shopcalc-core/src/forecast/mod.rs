pub mod inventory;
pub mod monthly;
pub mod receivables;

#[cfg(feature = "simulation")]
pub mod simulation;
