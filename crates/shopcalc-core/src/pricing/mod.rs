pub mod derived;
pub mod markup;
pub mod scenarios;
