pub mod report;
pub mod wobject;
