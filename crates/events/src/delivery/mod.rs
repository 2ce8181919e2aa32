pub mod storage_api;
