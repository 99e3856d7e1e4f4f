pub mod conf;
pub mod loadgen;
pub mod run;
