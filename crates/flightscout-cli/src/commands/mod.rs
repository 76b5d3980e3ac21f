pub mod completion;
pub mod history;
pub mod report;
pub mod run;
pub mod sources;
