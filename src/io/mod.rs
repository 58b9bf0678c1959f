pub mod pass;
pub mod prng;
