pub mod gateway;
pub mod storage;
