pub mod bouquet_repository;
pub mod epg_repository;
pub mod storage;
