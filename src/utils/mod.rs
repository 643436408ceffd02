pub mod fs;
pub mod storage;
