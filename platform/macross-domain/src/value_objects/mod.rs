pub mod bar;
pub mod interval;
pub mod signal;
