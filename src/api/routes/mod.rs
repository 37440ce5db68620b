pub mod health;
pub mod rescan;
pub mod work;
pub mod results;
pub mod hosts;
pub mod tasks;
