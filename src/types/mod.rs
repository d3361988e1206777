pub mod inference;
pub mod lead;
pub mod mail;
pub mod run;
