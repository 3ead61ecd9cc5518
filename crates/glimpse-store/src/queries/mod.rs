pub mod events;
pub mod totals;
