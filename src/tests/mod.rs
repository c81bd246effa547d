mod recommend;
pub mod support;
