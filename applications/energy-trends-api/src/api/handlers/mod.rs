pub mod energy;
pub mod health;
