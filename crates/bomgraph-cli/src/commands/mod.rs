pub mod bom;
pub mod build;
pub mod commit;
pub mod export;
pub mod init;
