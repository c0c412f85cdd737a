pub mod input;
pub mod pool;
pub mod time;
pub mod timer;
