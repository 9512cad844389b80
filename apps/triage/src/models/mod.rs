pub mod firm;
pub mod opportunity;
pub mod report;
