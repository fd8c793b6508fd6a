pub mod health;
pub mod requirements;
